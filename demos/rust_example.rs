use sdk_rust::RelayClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client = RelayClient::new("http://127.0.0.1:30006");

    // 1. Start a new task
    println!("Sending prompt...");
    let reply = client.submit_prompt("Summarize the open pull requests", false).await?;
    println!("Status {}: {:?}", reply.status, reply.body);

    // 2. Follow up in the same conversation
    let reply = client.submit_prompt("Now only the ones touching the parser", true).await?;
    println!("Status {}: {:?}", reply.status, reply.body);

    // 3. Relay status
    println!("{}", client.status().await?);

    Ok(())
}
