use async_trait::async_trait;

use crate::domain::{PriceTick, RawOrder};
use crate::error::Result;

/// Read-only view of the trader's exchange account
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Orders still resting on the book
    async fn open_orders(&self) -> Result<Vec<RawOrder>>;

    /// Every order the account ever placed on `symbol`, any status
    async fn order_history(&self, symbol: &str) -> Result<Vec<RawOrder>>;

    /// Latest price for every listed symbol
    async fn prices(&self) -> Result<Vec<PriceTick>>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::error::WatcherError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned gateway for pipeline tests.
    ///
    /// Records every history lookup so tests can assert on caching.
    #[derive(Default)]
    pub struct MockGateway {
        pub open: Vec<RawOrder>,
        pub history: HashMap<String, Vec<RawOrder>>,
        pub ticks: Vec<PriceTick>,
        pub fail_orders: bool,
        pub fail_prices: bool,
        pub fail_history: bool,
        pub history_calls: Mutex<Vec<String>>,
    }

    impl MockGateway {
        pub fn new(open: Vec<RawOrder>, ticks: Vec<PriceTick>) -> Self {
            Self {
                open,
                ticks,
                ..Default::default()
            }
        }

        pub fn with_history(mut self, symbol: &str, orders: Vec<RawOrder>) -> Self {
            self.history.insert(symbol.to_string(), orders);
            self
        }

        pub fn history_calls(&self) -> Vec<String> {
            self.history_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExchangeGateway for MockGateway {
        async fn open_orders(&self) -> Result<Vec<RawOrder>> {
            if self.fail_orders {
                return Err(WatcherError::Exchange("openOrders: 503".to_string()));
            }
            Ok(self.open.clone())
        }

        async fn order_history(&self, symbol: &str) -> Result<Vec<RawOrder>> {
            self.history_calls.lock().unwrap().push(symbol.to_string());
            if self.fail_history {
                return Err(WatcherError::Exchange("allOrders: 503".to_string()));
            }
            Ok(self.history.get(symbol).cloned().unwrap_or_default())
        }

        async fn prices(&self) -> Result<Vec<PriceTick>> {
            if self.fail_prices {
                return Err(WatcherError::Exchange("ticker/price: 503".to_string()));
            }
            Ok(self.ticks.clone())
        }
    }
}
