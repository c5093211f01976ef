use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct PromptRequest<'a> {
    pub prompt: &'a str,
    #[serde(rename = "continueConversation")]
    pub continue_conversation: bool,
}

/// What the relay answered for a prompt.
#[derive(Debug, Clone)]
pub struct PromptReply {
    pub status: u16,
    pub correlation_id: Option<String>,
    pub body: Value,
}

impl PromptReply {
    /// The engine's payload for a `200` reply.
    pub fn response(&self) -> Option<&Value> {
        self.body.get("response")
    }

    /// The error message for any non-`200` reply.
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionAck {
    pub delivered: bool,
}

pub struct RelayClient {
    client: Client,
    relay_url: String,
}

impl RelayClient {
    pub fn new(relay_url: &str) -> Self {
        Self {
            client: Client::builder()
                .no_proxy()
                .build()
                .unwrap_or_else(|_| Client::new()),
            relay_url: relay_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send a prompt and wait for the relay's single answer.
    pub async fn submit_prompt(
        &self,
        prompt: &str,
        continue_conversation: bool,
    ) -> Result<PromptReply, Box<dyn std::error::Error + Send + Sync>> {
        let resp = self
            .client
            .post(format!("{}/prompt", self.relay_url))
            .json(&PromptRequest {
                prompt,
                continue_conversation,
            })
            .send()
            .await?;

        let status = resp.status().as_u16();
        let correlation_id = resp
            .headers()
            .get("x-correlation-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = resp.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(PromptReply {
            status,
            correlation_id,
            body,
        })
    }

    /// Deliver a completion for a parked request.
    pub async fn complete(
        &self,
        id: &str,
        success: bool,
        data: Value,
    ) -> Result<CompletionAck, Box<dyn std::error::Error + Send + Sync>> {
        let ack = self
            .client
            .post(format!("{}/complete/{}", self.relay_url, id))
            .json(&serde_json::json!({ "success": success, "data": data }))
            .send()
            .await?
            .error_for_status()?
            .json::<CompletionAck>()
            .await?;
        Ok(ack)
    }

    pub async fn status(&self) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let status = self
            .client
            .get(format!("{}/status", self.relay_url))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(status)
    }
}
