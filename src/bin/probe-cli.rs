use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "probe-cli")]
#[command(about = "Query the probe endpoints of a running edge-guard", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:13080")]
    url: String,

    /// Give up after this many seconds
    #[arg(short, long, default_value_t = 20)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness (/health/live)
    Live,
    /// Readiness including the upstream dependency (/health/ready)
    Ready,
    /// Basic health (/health)
    Health,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Live => "/health/live",
            Commands::Ready => "/health/ready",
            Commands::Health => "/health",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match probe(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn probe(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(cli.timeout))
        .build()?;

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = client.get(&url).send().await?;
    let status = res.status();

    match res.json::<Value>().await {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(e) => eprintln!("Response was not JSON: {}", e),
    }

    if status != reqwest::StatusCode::OK {
        eprintln!("Error: {} returned status {}", url, status);
        return Ok(false);
    }
    Ok(true)
}
