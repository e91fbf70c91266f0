//! gleipnir: run a numeric range through a limit stage.

use std::path::PathBuf;

use clap::Parser;
use futures_util::StreamExt;
use tracing::info;

use gleipnir::{Config, IterPublisher, PublisherExt};

/// Stream `0..items` through `limit(n)` and print what comes out.
#[derive(Parser)]
#[command(name = "gleipnir")]
#[command(version)]
#[command(about = "Bounded-demand limit stage demo")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "GLEIPNIR_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of items to let through (overrides config).
    #[arg(short, long)]
    limit: Option<u64>,

    /// Number of items the source produces.
    #[arg(short, long, default_value_t = 1_000)]
    items: u64,

    /// Items prefetched ahead of the consumer (overrides config).
    #[arg(short, long)]
    buffer: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let limit = args.limit.unwrap_or(config.relay.limit);
    let buffer = args.buffer.unwrap_or(config.stream.buffer);
    info!(limit, buffer, items = args.items, "starting limited stream");

    let mut stream = IterPublisher::new(0..args.items)
        .limit(limit)
        .into_stream(buffer);

    while let Some(item) = stream.next().await {
        match item {
            Ok(value) => println!("{value}"),
            Err(e) => {
                eprintln!("error: {e}");
                return Err(e.into());
            }
        }
    }
    println!("completed");

    Ok(())
}
