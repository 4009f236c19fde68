use anyhow::{Context, Result};
use std::sync::Arc;

use herald::config::Config;
use herald::scheduler::{DispatchEngine, SchedulerRunner};
use herald::sender::{WebhookConfig, WebhookSender};
use herald::storage::create_sqlite_store;

/// Run the dispatch scheduler until interrupted
pub async fn run(config: Config, tick_override: Option<u64>) -> Result<()> {
    let tick_secs = tick_override.unwrap_or(config.scheduler.tick_secs);

    if let Some(dir) = config.database.sqlite_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        }
    }

    let store = create_sqlite_store(&config.database.sqlite_path)
        .with_context(|| format!("Failed to open {}", config.database.sqlite_path.display()))?;

    let mut webhook = WebhookConfig::new(&config.sender.endpoint)
        .with_timeout(config.sender.timeout_secs);
    if let Some(token) = &config.sender.auth_token {
        webhook = webhook.with_auth_token(token);
    }
    let sender = Arc::new(WebhookSender::new(webhook).context("Failed to build sender")?);

    let engine = Arc::new(DispatchEngine::new(store, sender));
    let runner = SchedulerRunner::new(engine, tick_secs).context("Invalid tick period")?;

    runner.start().await;
    tracing::info!(tick_secs, "Dispatcher running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutdown requested");
    runner.stop().await;

    Ok(())
}
