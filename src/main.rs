use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

mod config;
mod display;
mod error;
mod fetch;
mod poller;
mod predictor;

use crate::config::Config;
use crate::display::{ConsoleScreen, PublishedState};
use crate::fetch::HttpCountSource;
use crate::poller::Poller;
use crate::predictor::Predictor;

#[derive(Parser)]
#[command(name = "queuecast")]
#[command(about = "Polls a visitor counter and predicts waiting time with an on-device model")]
struct Cli {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;

    info!("Starting queuecast");

    // A missing or corrupt model is not fatal; the screen degrades to
    // showing the raw count only.
    let predictor = match Predictor::load_from_file(&config.predictor.model_path).await {
        Ok(predictor) => Some(Arc::new(predictor)),
        Err(e) => {
            warn!("Prediction model unavailable: {}", e);
            None
        }
    };

    let source = HttpCountSource::new(&config.server)?;
    let state = Arc::new(PublishedState::new());
    let screen = Arc::new(ConsoleScreen::new(&config.display));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let poller_handle = tokio::spawn({
        let poller = Poller::new(source, predictor, state.clone(), screen);
        async move {
            poller.run(shutdown_rx).await;
        }
    });

    info!("Poll loop started");

    // Wait for shutdown signal
    signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping poll loop...");

    let _ = shutdown_tx.send(true);
    poller_handle.await?;

    Ok(())
}
