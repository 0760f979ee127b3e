//! Wires the watcher from configuration
//!
//! Shared by `serve`, `refresh` and the integration tests.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::adapters::{BinanceClient, MailjetNotifier, SqliteStore};
use crate::api::{AccessGate, AppState};
use crate::config::{AppConfig, DatabaseConfig};
use crate::error::Result;
use crate::exchange::ExchangeGateway;
use crate::notify::{LogNotifier, Notifier};
use crate::persistence::Store;
use crate::services::{AlertEvaluator, Enricher, RefreshPipeline, Scheduler};

/// Everything the binary runs, built once
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn Store>,
    pub pipeline: Arc<RefreshPipeline>,
    pub gate: Arc<AccessGate>,
}

impl Services {
    pub fn app_state(&self) -> AppState {
        AppState::new(self.store.clone(), self.pipeline.clone(), self.gate.clone())
    }

    pub fn scheduler(&self, interval: Duration) -> Scheduler {
        Scheduler::new(self.pipeline.clone(), interval)
    }
}

/// Open the database and apply migrations
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<SqliteStore>> {
    let store = SqliteStore::new(&config.url, config.max_connections).await?;
    store.migrate().await?;
    Ok(Arc::new(store))
}

/// Mailjet when credentials are configured, log output otherwise
pub fn build_notifier(config: &AppConfig) -> Result<Arc<dyn Notifier>> {
    if config.mailer.is_enabled() {
        let timeout = Duration::from_secs(config.mailer.timeout_secs);
        info!("Mail notifications enabled");
        Ok(Arc::new(MailjetNotifier::new(&config.mailer, timeout)?))
    } else {
        warn!("Mailer not configured, notifications will only be logged");
        Ok(Arc::new(LogNotifier))
    }
}

/// Assemble the services around explicit collaborators
pub fn assemble(
    config: &AppConfig,
    gateway: Arc<dyn ExchangeGateway>,
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
) -> Services {
    let enricher = Enricher::new(gateway, store.clone());
    let evaluator = AlertEvaluator::new(store.clone(), notifier.clone(), &config.mailer.subject);
    let pipeline = Arc::new(RefreshPipeline::new(enricher, evaluator));
    let gate = Arc::new(AccessGate::new(&config.auth, store.clone(), notifier));

    Services {
        store,
        pipeline,
        gate,
    }
}

/// Build the production services from configuration
pub async fn build_services(config: &AppConfig) -> Result<Services> {
    let store = open_store(&config.database).await?;
    let gateway = Arc::new(BinanceClient::new(&config.exchange)?);
    info!("Exchange endpoint: {}", gateway.base_url());
    let notifier = build_notifier(config)?;

    Ok(assemble(config, gateway, store, notifier))
}
