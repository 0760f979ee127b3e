use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Latest traded price for a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTick {
    pub symbol: String,
    pub price: Decimal,
}

impl PriceTick {
    pub fn new(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
        }
    }
}

/// Symbol lookup over one batch of ticks
pub fn index_prices(ticks: &[PriceTick]) -> HashMap<&str, Decimal> {
    ticks
        .iter()
        .map(|tick| (tick.symbol.as_str(), tick.price))
        .collect()
}
