mod sim;

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Gemello digital-twin gateway.
#[derive(Parser)]
#[command(name = "gemello", version, about = "Digital-twin HTTP gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a simulated twin over the HTTP gateway
    Serve {
        /// Bind host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Bind port
        #[arg(long, default_value_t = 3000)]
        port: u16,

        /// Twin identifier
        #[arg(long, default_value = "gemello-demo-twin")]
        id: String,

        /// Seconds between simulated state recomputations
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            id,
            interval,
        } => {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Failed to start runtime: {e}");
                    process::exit(1);
                }
            };
            if let Err(e) = rt.block_on(sim::run(id, host, port, interval)) {
                eprintln!("Server error: {e}");
                process::exit(1);
            }
        }
    }
}
