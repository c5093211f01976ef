//! Load testing for the prompt relay.

use std::sync::Arc;
use std::time::{Duration, Instant};

use prompt_relay::config::EngineConfig;
use prompt_relay::LocalEngine;
use sdk_rust::RelayClient;

mod common;

#[tokio::test]
async fn test_concurrent_prompts_each_answered_once() {
    let engine = Arc::new(LocalEngine::spawn(&EngineConfig {
        attached: true,
        queue_capacity: 1024,
        reply_delay_ms: 1,
    }));
    let (server, url) = common::start_relay(common::test_config(30_000), engine.clone()).await;

    let concurrency = 20;
    let requests_per_task = 25;
    let total_requests = concurrency * requests_per_task;

    let start = Instant::now();
    let mut handles = Vec::new();
    for task in 0..concurrency {
        let url = url.clone();
        handles.push(tokio::spawn(async move {
            let client = RelayClient::new(&url);
            let mut ok = 0;
            for i in 0..requests_per_task {
                let prompt = format!("task {} prompt {}", task, i);
                let reply = client.submit_prompt(&prompt, false).await.unwrap();
                if reply.status == 200
                    && reply.response() == Some(&serde_json::json!(format!("Received: {}", prompt)))
                {
                    ok += 1;
                }
            }
            ok
        }));
    }

    let mut success_count = 0;
    for handle in handles {
        success_count += handle.await.unwrap();
    }
    let duration = start.elapsed();

    println!("Load Test Results:");
    println!("Total Requests: {}", total_requests);
    println!("Successful: {}", success_count);
    println!("Total Time: {:?}", duration);
    println!("Throughput: {:.2} req/s", total_requests as f64 / duration.as_secs_f64());

    assert_eq!(success_count, total_requests, "every prompt gets exactly its own answer");
    assert_eq!(server.broker().await.unwrap().pending(), 0);
    assert_eq!(engine.conversation_count(), 1);
    assert!(duration < Duration::from_secs(30));

    server.stop().await.unwrap();
}
