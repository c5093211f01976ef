pub mod client;

pub use client::{PromptReply, RelayClient};
