mod config;
mod engine;
mod error;
mod indicator;
mod model;
mod provider;
mod smoothing;
mod transport;
mod validate;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use provider::DataProvider;
use provider::yahoo::YahooProvider;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("transport error")]
    Transport,
}

#[derive(Parser)]
#[command(
    name = "ta-bridge",
    about = "Technical analysis engine served over line-delimited JSON"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "ta-bridge.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    init_tracing(&config);

    let provider: Option<Arc<dyn DataProvider>> = if config.provider.enabled {
        Some(Arc::new(YahooProvider::new(
            config.provider.base_url.clone(),
            Some(config.provider.requests_per_second),
        )))
    } else {
        tracing::warn!("data provider disabled; serving compute methods only");
        None
    };

    let cancel = CancellationToken::new();
    let serve_cancel = cancel.clone();
    let mut serve_handle = tokio::spawn(async move {
        transport::serve(provider, serve_cancel).await
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl+c received, shutting down");
            cancel.cancel();
            let _ = tokio::time::timeout(Duration::from_secs(5), &mut serve_handle).await;
        }
        result = &mut serve_handle => {
            return match result {
                Ok(serve_result) => serve_result.change_context(AppError::Transport),
                Err(join_error) => {
                    Err(Report::new(join_error).change_context(AppError::Transport))
                }
            };
        }
    }

    info!("shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    // Log to stderr: stdout carries the response stream.
    let filter = EnvFilter::new(&config.general.log_level);
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
