//! Periodic pipeline runner

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::RefreshPipeline;

/// Runs the refresh pipeline on a fixed interval
pub struct Scheduler {
    pipeline: Arc<RefreshPipeline>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(pipeline: Arc<RefreshPipeline>, interval: Duration) -> Self {
        Self { pipeline, interval }
    }

    /// Run one pipeline pass and log the outcome
    pub async fn tick(&self) {
        match self.pipeline.run().await {
            Ok(summary) if summary.alerts.has_failures() => {
                warn!(
                    "Scheduled refresh done with {} undelivered alerts",
                    summary.alerts.failed.len()
                );
            }
            Ok(summary) => {
                info!(
                    "Scheduled refresh done: {} orders, {} alerts fired",
                    summary.orders, summary.alerts.fired
                );
            }
            Err(e) if e.is_transient() => {
                warn!("Scheduled refresh failed, retrying next cycle: {}", e);
            }
            Err(e) => {
                error!("Scheduled refresh failed: {}", e);
            }
        }
    }

    /// Loop forever; failures are logged and the next cycle still runs
    pub async fn run(self) {
        info!("Starting scheduler (interval: {}s)", self.interval.as_secs());
        loop {
            self.tick().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
