use clap::Parser;
use std::env;
use std::sync::Arc;
use tracing::error;

use fire_projection::api::{self, Cli, FallbackRates};

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() {
    init_logging();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .or_else(|| env::var("FIRE_PORT").ok().and_then(|s| s.parse::<u16>().ok()))
            .unwrap_or(DEFAULT_PORT);
        if let Err(e) = api::run_http_server(port, Arc::new(FallbackRates)).await {
            error!(error = %e, "server error");
            eprintln!("Server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let cli = Cli::parse();
    match api::run_cli(&cli, &FallbackRates) {
        Ok(report) => print!("{report}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr so stdout stays clean CSV. `RUST_LOG` overrides the
/// default `info` filter.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
