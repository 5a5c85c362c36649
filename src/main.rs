use acbridge::{Bridge, Config};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};

fn load_config() -> Result<Config> {
    match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path)),
        None => Config::load().context("Failed to load configuration"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    config.validate().context("Invalid configuration")?;
    acbridge::logging::init_logging(&config.logging)?;

    info!(
        "acbridge {} starting with {} climate device(s)",
        env!("APP_VERSION"),
        config.climates.len()
    );

    let bridge = Arc::new(Bridge::start(&config).context("Failed to start climate drivers")?);
    let config = Arc::new(config);

    let web_bridge = bridge.clone();
    let web_config = config.clone();
    let web_task = tokio::spawn(async move {
        if let Err(e) = acbridge::web::serve(web_bridge, web_config).await {
            error!("Web server error: {}", e);
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    web_task.abort();
    bridge.shutdown().await;
    info!("acbridge stopped");
    Ok(())
}
