use anyhow::Context;
use clap::Parser;
use order_watch::adapters::start_api_server;
use order_watch::bootstrap::{build_services, open_store};
use order_watch::cli::{Cli, Commands};
use order_watch::config::AppConfig;
use order_watch::domain::display_or_na;
use order_watch::persistence::Store;
use tracing::{error, info, warn};

mod main_runtime;

use main_runtime::{init_logging, init_logging_simple, shutdown_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match AppConfig::load_from(&cli.config_dir) {
        Ok(config) => config,
        Err(e) => {
            init_logging_simple();
            error!("Failed to load configuration from {}: {}", cli.config_dir.display(), e);
            return Err(e)
                .with_context(|| format!("loading configuration from {}", cli.config_dir.display()));
        }
    };
    let _log_guard = init_logging(&config.logging);

    match cli.effective_command() {
        Commands::Serve { no_scheduler } => run_serve(&config, no_scheduler).await,
        Commands::Refresh => run_refresh(&config).await,
        Commands::Unlock { source } => run_unlock(&config, &source).await,
    }
}

fn ensure_valid(config: &AppConfig) -> anyhow::Result<()> {
    if let Err(errors) = config.validate() {
        for problem in &errors {
            error!("Invalid configuration: {}", problem);
        }
        anyhow::bail!("invalid configuration: {}", errors.join("; "));
    }
    Ok(())
}

async fn run_serve(config: &AppConfig, no_scheduler: bool) -> anyhow::Result<()> {
    ensure_valid(config)?;
    let services = build_services(config)
        .await
        .context("failed to build services")?;

    let scheduler = if no_scheduler {
        warn!("Scheduler disabled, refresh only through /refresh");
        None
    } else {
        Some(services.scheduler(config.scheduler.interval()).spawn())
    };

    let result = start_api_server(
        services.app_state(),
        &config.server.host,
        config.server.port,
        shutdown_signal(),
    )
    .await;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    info!("Shutdown complete");
    result.context("API server failed")
}

async fn run_refresh(config: &AppConfig) -> anyhow::Result<()> {
    ensure_valid(config)?;
    let services = build_services(config)
        .await
        .context("failed to build services")?;
    let summary = services.pipeline.run().await.context("refresh failed")?;

    println!(
        "Refreshed {} orders and {} prices; alerts: {} evaluated, {} fired, {} skipped, {} failed",
        summary.orders,
        summary.prices,
        summary.alerts.evaluated,
        summary.alerts.fired,
        summary.alerts.skipped,
        summary.alerts.failed.len()
    );
    for row in services.store.orders().await? {
        println!(
            "  {:<12} #{:<12} {} {:>14} market={} spread={} last_fill={} completed={}",
            row.order.symbol,
            row.order.order_id,
            row.order.side,
            row.order.price.normalize(),
            display_or_na(row.market_price),
            display_or_na(row.spread),
            display_or_na(row.last_filled_price),
            display_or_na(row.percent_completed),
        );
    }
    for failed in &summary.alerts.failed {
        println!("  undelivered: {} {} ({})", failed.symbol, failed.id, failed.error);
    }
    Ok(())
}

async fn run_unlock(config: &AppConfig, source: &str) -> anyhow::Result<()> {
    let store = open_store(&config.database)
        .await
        .with_context(|| format!("opening database {}", config.database.url))?;

    let Some(record) = store.auth_attempt(source).await? else {
        println!("No failed-login record for {}", source);
        return Ok(());
    };

    store.clear_auth_source(source).await?;
    let state = if record.is_locked(config.auth.max_attempts) {
        "locked"
    } else {
        "not locked"
    };
    info!(source, attempts = record.attempts, "failed-login record cleared");
    println!(
        "Cleared failed-login record for {} ({} attempts, {})",
        source, record.attempts, state
    );
    Ok(())
}
