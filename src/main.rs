//! Switchyard server binary.
//!
//! Serves the sample application from `switchyard::app` with the configured
//! listener, logging and request deadline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use switchyard::lifecycle::{signals, startup, Shutdown};
use switchyard::{app, Dispatcher, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "switchyard", version, about = "Fast HTTP request router")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = startup::load_config(args.config.as_deref())?;
    startup::init(&config);
    tracing::info!("switchyard v{} starting", env!("CARGO_PKG_VERSION"));

    let dispatcher = Arc::new(Dispatcher::new(app::demo_router()?));
    let listener = startup::bind(&config).await?;
    let grace = Duration::from_secs(config.timeouts.shutdown_secs);

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, dispatcher);
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            result??;
            return Ok(());
        }
        _ = signals::wait_for_signal() => {}
    }

    shutdown.trigger();
    match tokio::time::timeout(grace, server_task).await {
        Ok(result) => result??,
        Err(_) => tracing::warn!(grace_secs = grace.as_secs(), "Shutdown deadline reached, forcing exit"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
