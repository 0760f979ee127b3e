//! Open-order enrichment
//!
//! Pulls open orders and prices from the exchange, derives the dashboard
//! metrics per order and swaps the stored snapshot.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::{index_prices, EnrichedOrder, PriceTick, RawOrder};
use crate::error::Result;
use crate::exchange::ExchangeGateway;
use crate::persistence::Store;

/// Builds and persists the enriched order snapshot
pub struct Enricher {
    gateway: Arc<dyn ExchangeGateway>,
    store: Arc<dyn Store>,
}

impl Enricher {
    pub fn new(gateway: Arc<dyn ExchangeGateway>, store: Arc<dyn Store>) -> Self {
        Self { gateway, store }
    }

    /// Fetch, enrich and persist. Returns what was written.
    ///
    /// Nothing is written unless every exchange call succeeded.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(Vec<EnrichedOrder>, Vec<PriceTick>)> {
        let open = self.gateway.open_orders().await?;
        let ticks = self.gateway.prices().await?;
        debug!("Fetched {} open orders and {} prices", open.len(), ticks.len());

        let market = index_prices(&ticks);
        // one history fetch per symbol per pass
        let mut last_fills: HashMap<String, Option<Decimal>> = HashMap::new();
        let mut enriched = Vec::with_capacity(open.len());

        for order in open {
            let market_price = market.get(order.symbol.as_str()).copied();
            if market_price.is_none() {
                warn!(
                    symbol = %order.symbol,
                    order_id = order.order_id,
                    "no market price for open order, metrics not available"
                );
            }

            let last_filled_price = match last_fills.get(&order.symbol) {
                Some(cached) => *cached,
                None => {
                    let history = self.gateway.order_history(&order.symbol).await?;
                    let price = last_filled_price(&history);
                    last_fills.insert(order.symbol.clone(), price);
                    price
                }
            };

            if last_filled_price == Some(order.price) {
                warn!(
                    symbol = %order.symbol,
                    order_id = order.order_id,
                    "order price equals last fill, percent completed not available"
                );
            }

            enriched.push(EnrichedOrder::derive(order, market_price, last_filled_price));
        }

        self.store.replace_snapshot(&enriched, &ticks).await?;
        info!(
            "Snapshot refreshed: {} orders, {} prices",
            enriched.len(),
            ticks.len()
        );

        Ok((enriched, ticks))
    }
}

/// Price of the most recently updated FILLED order
pub fn last_filled_price(history: &[RawOrder]) -> Option<Decimal> {
    history
        .iter()
        .filter(|o| o.status.is_filled())
        .max_by_key(|o| o.update_time)
        .map(|o| o.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SqliteStore;
    use crate::domain::fixtures::{past_order, raw_order};
    use crate::domain::OrderStatus;
    use crate::exchange::mock::MockGateway;
    use rust_decimal_macros::dec;

    async fn setup(gateway: MockGateway) -> (Arc<MockGateway>, Arc<SqliteStore>, Enricher) {
        let gateway = Arc::new(gateway);
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let enricher = Enricher::new(gateway.clone(), store.clone());
        (gateway, store, enricher)
    }

    #[test]
    fn test_last_fill_is_latest_filled_order() {
        let history = vec![
            past_order("BTCUSDT", 1, dec!(80), OrderStatus::Filled, 100),
            past_order("BTCUSDT", 2, dec!(90), OrderStatus::Filled, 300),
            past_order("BTCUSDT", 3, dec!(70), OrderStatus::Canceled, 500),
            past_order("BTCUSDT", 4, dec!(60), OrderStatus::New, 600),
        ];
        assert_eq!(last_filled_price(&history), Some(dec!(90)));
        assert_eq!(last_filled_price(&history[2..]), None);
    }

    #[tokio::test]
    async fn test_refresh_enriches_and_persists() {
        let gateway = MockGateway::new(
            vec![raw_order("BTCUSDT", 10, dec!(100))],
            vec![PriceTick::new("BTCUSDT", dec!(95))],
        )
        .with_history(
            "BTCUSDT",
            vec![past_order("BTCUSDT", 9, dec!(90), OrderStatus::Filled, 200)],
        );
        let (_, store, enricher) = setup(gateway).await;

        let (orders, ticks) = enricher.refresh().await.unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].market_price, Some(dec!(95)));
        assert_eq!(orders[0].spread, Some(dec!(5)));
        assert_eq!(orders[0].last_filled_price, Some(dec!(90)));
        assert_eq!(orders[0].percent_completed, Some(dec!(50)));
        assert_eq!(store.orders().await.unwrap(), orders);
        assert_eq!(store.prices().await.unwrap(), ticks);
    }

    #[tokio::test]
    async fn test_history_fetched_once_per_symbol() {
        let gateway = MockGateway::new(
            vec![
                raw_order("BTCUSDT", 1, dec!(100)),
                raw_order("BTCUSDT", 2, dec!(110)),
                raw_order("ETHUSDT", 3, dec!(2000)),
            ],
            vec![
                PriceTick::new("BTCUSDT", dec!(95)),
                PriceTick::new("ETHUSDT", dec!(1900)),
            ],
        );
        let (gateway, _, enricher) = setup(gateway).await;

        let (orders, _) = enricher.refresh().await.unwrap();

        assert_eq!(orders.len(), 3);
        assert!(orders.iter().all(|o| o.percent_completed.is_none()));
        let mut calls = gateway.history_calls();
        calls.sort();
        assert_eq!(calls, vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_price_keeps_order_without_metrics() {
        let gateway = MockGateway::new(
            vec![raw_order("NEWCOIN", 1, dec!(1))],
            vec![PriceTick::new("BTCUSDT", dec!(95))],
        );
        let (_, _, enricher) = setup(gateway).await;

        let (orders, _) = enricher.refresh().await.unwrap();
        assert_eq!(orders[0].market_price, None);
        assert_eq!(orders[0].spread, None);
        assert_eq!(orders[0].percent_completed, None);
    }

    #[tokio::test]
    async fn test_exchange_failure_keeps_previous_snapshot() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let good = Arc::new(MockGateway::new(
            vec![raw_order("BTCUSDT", 1, dec!(100))],
            vec![PriceTick::new("BTCUSDT", dec!(95))],
        ));
        Enricher::new(good, store.clone()).refresh().await.unwrap();

        let broken = Arc::new(MockGateway {
            open: vec![raw_order("ETHUSDT", 2, dec!(2000))],
            fail_history: true,
            ..Default::default()
        });
        assert!(Enricher::new(broken, store.clone()).refresh().await.is_err());

        let orders = store.orders().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order.symbol, "BTCUSDT");

        let no_prices = Arc::new(MockGateway {
            fail_prices: true,
            ..Default::default()
        });
        assert!(Enricher::new(no_prices, store.clone()).refresh().await.is_err());
        assert_eq!(store.prices().await.unwrap().len(), 1);
    }
}
