use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for the prompt relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:30006")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prompt and wait for the answer
    Prompt {
        text: String,
        /// Add to the current conversation instead of starting a new task
        #[arg(short = 'c', long = "continue")]
        continue_conversation: bool,
    },
    /// Deliver a completion for a parked request
    Complete {
        id: String,
        /// JSON value to deliver (plain text is sent as a string)
        data: String,
        /// Report a failure instead of a result
        #[arg(long)]
        failed: bool,
    },
    /// Show relay status
    Status,
    /// Send a JSON payload to the log endpoint
    Log { payload: String },
}

fn parse_json_or_string(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = match cli.command {
        Commands::Prompt {
            text,
            continue_conversation,
        } => {
            client
                .post(format!("{}/prompt", cli.url))
                .json(&json!({ "prompt": text, "continueConversation": continue_conversation }))
                .send()
                .await?
        }
        Commands::Complete { id, data, failed } => {
            client
                .post(format!("{}/complete/{}", cli.url, id))
                .json(&json!({ "success": !failed, "data": parse_json_or_string(&data) }))
                .send()
                .await?
        }
        Commands::Status => client.get(format!("{}/status", cli.url)).send().await?,
        Commands::Log { payload } => {
            client
                .post(format!("{}/log", cli.url))
                .json(&parse_json_or_string(&payload))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(id) = res.headers().get("x-correlation-id") {
        println!("Correlation ID: {}", id.to_str().unwrap_or("<invalid>"));
    }
    let text = res.text().await?;

    println!("Status: {}", status);
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
