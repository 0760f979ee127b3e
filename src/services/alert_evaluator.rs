//! Price alert evaluation
//!
//! Compares every stored alert against a fresh price batch and notifies the
//! alert's owner when its threshold has been crossed.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{index_prices, PriceTick};
use crate::error::Result;
use crate::notify::Notifier;
use crate::persistence::Store;

/// Alert whose notification could not be delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAlert {
    pub id: Uuid,
    pub symbol: String,
    pub error: String,
}

/// Outcome of one evaluation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertReport {
    pub evaluated: usize,
    pub fired: usize,
    /// Alerts whose symbol had no price in the batch
    pub skipped: usize,
    pub failed: Vec<FailedAlert>,
}

impl AlertReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

pub struct AlertEvaluator {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    subject: String,
}

impl AlertEvaluator {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, subject: impl Into<String>) -> Self {
        Self {
            store,
            notifier,
            subject: subject.into(),
        }
    }

    /// Evaluate every stored alert against `prices`.
    ///
    /// A fired alert is deleted only once its notification went out.
    #[instrument(skip(self, prices), fields(prices = prices.len()))]
    pub async fn check(&self, prices: &[PriceTick]) -> Result<AlertReport> {
        let alerts = self.store.alerts().await?;
        let market = index_prices(prices);
        let mut report = AlertReport::default();

        for alert in alerts {
            report.evaluated += 1;

            let Some(current) = market.get(alert.symbol.as_str()).copied() else {
                warn!(id = %alert.id, symbol = %alert.symbol, "no price for alert symbol, skipping");
                report.skipped += 1;
                continue;
            };

            if !alert.is_triggered(current) {
                continue;
            }

            let text = alert.message(current);
            if let Err(e) = self
                .notifier
                .send(&alert.recipient(), &self.subject, &text)
                .await
            {
                error!(id = %alert.id, symbol = %alert.symbol, "alert notification failed: {}", e);
                report.failed.push(FailedAlert {
                    id: alert.id,
                    symbol: alert.symbol.clone(),
                    error: e.to_string(),
                });
                continue;
            }

            self.store.delete_alert(alert.id).await?;
            report.fired += 1;
            info!(id = %alert.id, symbol = %alert.symbol, %current, "alert fired");
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SqliteStore;
    use crate::domain::fixtures::alert;
    use crate::notify::mock::RecordingNotifier;
    use rust_decimal_macros::dec;

    async fn setup(notifier: RecordingNotifier) -> (Arc<SqliteStore>, Arc<RecordingNotifier>, AlertEvaluator) {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let notifier = Arc::new(notifier);
        let evaluator = AlertEvaluator::new(store.clone(), notifier.clone(), "Order Alert");
        (store, notifier, evaluator)
    }

    #[tokio::test]
    async fn test_downward_alert_fires_and_is_deleted() {
        let (store, notifier, evaluator) = setup(RecordingNotifier::new()).await;
        store.add_alert(&alert("BTCUSDT", dec!(30000), true)).await.unwrap();

        let quiet = evaluator
            .check(&[PriceTick::new("BTCUSDT", dec!(30500))])
            .await
            .unwrap();
        assert_eq!(quiet.fired, 0);
        assert_eq!(store.alerts().await.unwrap().len(), 1);

        let report = evaluator
            .check(&[PriceTick::new("BTCUSDT", dec!(29500))])
            .await
            .unwrap();
        assert_eq!(report.evaluated, 1);
        assert_eq!(report.fired, 1);
        assert!(store.alerts().await.unwrap().is_empty());

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.email, "trader@example.com");
        assert_eq!(sent[0].subject, "Order Alert");
        assert!(sent[0].text.contains("29500"));
    }

    #[tokio::test]
    async fn test_fires_once_per_creation() {
        let (store, notifier, evaluator) = setup(RecordingNotifier::new()).await;
        store.add_alert(&alert("ETHUSDT", dec!(2000), false)).await.unwrap();

        let ticks = [PriceTick::new("ETHUSDT", dec!(2100))];
        evaluator.check(&ticks).await.unwrap();
        let second = evaluator.check(&ticks).await.unwrap();

        assert_eq!(second.evaluated, 0);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_send_keeps_alert() {
        let (store, notifier, evaluator) = setup(RecordingNotifier::failing()).await;
        let a = alert("BTCUSDT", dec!(30000), true);
        store.add_alert(&a).await.unwrap();

        let ticks = [PriceTick::new("BTCUSDT", dec!(29000))];
        let report = evaluator.check(&ticks).await.unwrap();
        assert_eq!(report.fired, 0);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, a.id);
        assert!(report.has_failures());
        assert_eq!(store.alerts().await.unwrap().len(), 1);

        notifier.set_failing(false);
        let retry = evaluator.check(&ticks).await.unwrap();
        assert_eq!(retry.fired, 1);
        assert!(store.alerts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_symbol_is_skipped() {
        let (store, notifier, evaluator) = setup(RecordingNotifier::new()).await;
        store.add_alert(&alert("DOGEUSDT", dec!(1), true)).await.unwrap();
        store.add_alert(&alert("BTCUSDT", dec!(30000), true)).await.unwrap();

        let report = evaluator
            .check(&[PriceTick::new("BTCUSDT", dec!(100))])
            .await
            .unwrap();

        assert_eq!(report.evaluated, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.fired, 1);
        assert_eq!(notifier.sent().len(), 1);
        let remaining = store.alerts().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].symbol, "DOGEUSDT");
    }
}
