use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Management CLI for the chain RPC proxy", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Public endpoint base URL, used by `health`.
    #[arg(short, long, default_value = "http://localhost:8888")]
    proxy_url: String,

    #[arg(short, long, env = "RPC_PROXY_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxy system status
    Status,
    /// List every chain with endpoint health
    Chains,
    /// Show one chain
    Chain { name: String },
    /// Register a chain from a JSON file (chain fields plus `endpoints`)
    AddChain { file: PathBuf },
    /// Stop probing a chain and remove it
    RemoveChain { name: String },
    /// Query the public health endpoint, optionally for one chain
    Health { chain: Option<String> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let admin = |path: &str| format!("{}/admin{}", cli.url.trim_end_matches('/'), path);

    let res = match cli.command {
        Commands::Status => client.get(admin("/status")).headers(headers).send().await?,
        Commands::Chains => client.get(admin("/chains")).headers(headers).send().await?,
        Commands::Chain { name } => {
            client
                .get(admin(&format!("/chains/{name}")))
                .headers(headers)
                .send()
                .await?
        }
        Commands::AddChain { file } => {
            let body: Value = serde_json::from_str(&std::fs::read_to_string(file)?)?;
            client
                .post(admin("/chains"))
                .headers(headers)
                .json(&body)
                .send()
                .await?
        }
        Commands::RemoveChain { name } => {
            client
                .delete(admin(&format!("/chains/{name}")))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Health { chain } => {
            let base = cli.proxy_url.trim_end_matches('/');
            let url = match chain {
                Some(chain) => format!("{base}/health/{chain}"),
                None => format!("{base}/health"),
            };
            client.get(url).send().await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
    }
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
