use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use super::{AlertEvaluator, AlertReport, Enricher};
use crate::error::Result;

/// Outcome of one refresh-and-check run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub orders: usize,
    pub prices: usize,
    pub alerts: AlertReport,
}

/// Refresh followed by alert evaluation, one run at a time.
///
/// Shared by the scheduler and the HTTP trigger so the two never interleave.
pub struct RefreshPipeline {
    enricher: Enricher,
    evaluator: AlertEvaluator,
    lock: Mutex<()>,
}

impl RefreshPipeline {
    pub fn new(enricher: Enricher, evaluator: AlertEvaluator) -> Self {
        Self {
            enricher,
            evaluator,
            lock: Mutex::new(()),
        }
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RefreshSummary> {
        let _guard = self.lock.lock().await;

        let (orders, prices) = self.enricher.refresh().await?;
        let alerts = self.evaluator.check(&prices).await?;

        info!(
            orders = orders.len(),
            prices = prices.len(),
            fired = alerts.fired,
            failed = alerts.failed.len(),
            "Refresh pipeline completed"
        );

        Ok(RefreshSummary {
            orders: orders.len(),
            prices: prices.len(),
            alerts,
        })
    }
}
