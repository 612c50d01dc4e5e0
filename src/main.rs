//! podcast2video CLI entrypoint

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use podcast2video::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Parse and execute CLI. The command future is dropped on Ctrl-C,
    // which removes any workspace it holds.
    let cli = Cli::parse();
    let result = {
        let command = cli.execute();
        tokio::select! {
            result = command => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        }
    };

    match result {
        Some(result) => result,
        None => {
            eprintln!("\n[Interrupted]");
            // A pending stdin prompt would otherwise hold up runtime shutdown.
            std::process::exit(130);
        }
    }
}
