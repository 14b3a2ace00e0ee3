//! rules-stub - in-memory backend for the rules console
//!
//! Serves the rules and parametric REST endpoints under `/api`.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use rules_console::stub::{self, Store};
use rules_console::ConsoleConfig;

#[derive(Parser)]
#[command(name = "rules-stub")]
#[command(version, about = "In-memory backend for the rules console", long_about = None)]
struct Cli {
    /// Path to console.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and STUB_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Start with empty tables
    #[arg(long)]
    empty: bool,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = ConsoleConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    let port = cli.port.unwrap_or(config.stub.port);
    let addr: SocketAddr = format!("{}:{}", config.stub.host, port)
        .parse()
        .map_err(|e| format!("Invalid listen address: {}", e))?;

    let store = if cli.empty || !config.stub.seed {
        Store::empty()
    } else {
        Store::seeded()
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;
    tracing::info!("Stub backend listening on http://{}/api", addr);

    stub::serve(listener, store)
        .await
        .map_err(|e| format!("Server error: {}", e))
}
