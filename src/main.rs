//! scriptcreds CLI
//!
//! Loads a config, primes the cache once, and prints what would be
//! published into a request. Useful for debugging header and cookie
//! commands outside the transport layer.

use clap::Parser;
use console::style;
use scriptcreds::config::ConfigManager;
use scriptcreds::{RequestHandle, ScriptCache, ScriptCredsResult};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "scriptcreds",
    version,
    about = "Script-driven HTTP header and cookie refresh cache"
)]
struct Cli {
    /// Path to config file (default: ~/.config/scriptcreds/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the target URL from the config
    #[arg(long)]
    url: Option<String>,

    /// Print the published headers and cookie as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ScriptCredsResult<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("scriptcreds=warn"),
        1 => EnvFilter::new("scriptcreds=info"),
        _ => EnvFilter::new("scriptcreds=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    let mut config = config_manager.load().await?;
    if let Some(url) = cli.url {
        config.url = url;
        config.validate()?;
    }

    let cache = ScriptCache::new(config);
    let mut handle = RequestHandle::new();
    cache.prepare(&mut handle).await?;

    if cli.json {
        let out = serde_json::json!({
            "headers": handle.headers(),
            "cookie": handle.cookie(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for header in handle.headers() {
            println!("{header}");
        }
        if let Some(cookie) = handle.cookie() {
            println!("Cookie: {cookie}");
        }
    }

    Ok(())
}
