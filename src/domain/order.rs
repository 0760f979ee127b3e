use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rendering of a derived value that could not be computed
pub const NOT_AVAILABLE: &str = "N/A";

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            other => Err(format!("unknown order side '{}'", other)),
        }
    }
}

/// Order status as reported by the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    PendingCancel,
    Rejected,
    Expired,
    ExpiredInMatch,
    /// Any status this build does not know about yet
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::PartiallyFilled => "PARTIALLY_FILLED",
            Self::Filled => "FILLED",
            Self::Canceled => "CANCELED",
            Self::PendingCancel => "PENDING_CANCEL",
            Self::Rejected => "REJECTED",
            Self::Expired => "EXPIRED",
            Self::ExpiredInMatch => "EXPIRED_IN_MATCH",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Self::Filled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(match raw.trim().to_ascii_uppercase().as_str() {
            "NEW" => Self::New,
            "PARTIALLY_FILLED" => Self::PartiallyFilled,
            "FILLED" => Self::Filled,
            "CANCELED" => Self::Canceled,
            "PENDING_CANCEL" => Self::PendingCancel,
            "REJECTED" => Self::Rejected,
            "EXPIRED" => Self::Expired,
            "EXPIRED_IN_MATCH" => Self::ExpiredInMatch,
            _ => Self::Unknown,
        })
    }
}

/// Order exactly as the exchange reports it.
///
/// Decimal fields arrive as strings (`"0.00100000"`) and are parsed here, at the
/// ingestion boundary; a malformed number fails the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    pub symbol: String,
    pub order_id: i64,
    #[serde(default)]
    pub order_list_id: i64,
    #[serde(default)]
    pub client_order_id: String,
    pub price: Decimal,
    pub orig_qty: Decimal,
    pub executed_qty: Decimal,
    #[serde(rename = "cummulativeQuoteQty")]
    pub cumulative_quote_qty: Decimal,
    pub status: OrderStatus,
    #[serde(default)]
    pub time_in_force: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub side: OrderSide,
    #[serde(default)]
    pub stop_price: Decimal,
    #[serde(default)]
    pub iceberg_qty: Decimal,
    /// Creation time, epoch milliseconds
    pub time: i64,
    /// Last update time, epoch milliseconds
    pub update_time: i64,
    #[serde(default)]
    pub is_working: bool,
}

/// Open order plus the metrics shown on the dashboard.
///
/// `None` in a derived field means "not available".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedOrder {
    #[serde(flatten)]
    pub order: RawOrder,
    /// Price of the most recent filled order for the symbol
    pub last_filled_price: Option<Decimal>,
    pub market_price: Option<Decimal>,
    /// Order price minus market price
    pub spread: Option<Decimal>,
    pub percent_completed: Option<Decimal>,
}

impl EnrichedOrder {
    /// Derive the dashboard metrics for `order`.
    pub fn derive(
        order: RawOrder,
        market_price: Option<Decimal>,
        last_filled_price: Option<Decimal>,
    ) -> Self {
        let spread = market_price.and_then(|market| order.price.checked_sub(market));
        let percent_completed = match (last_filled_price, market_price) {
            (Some(original), Some(market)) => percent_completed(original, market, order.price),
            _ => None,
        };

        Self {
            order,
            last_filled_price,
            market_price,
            spread,
            percent_completed,
        }
    }
}

/// How far the market has travelled from the last fill towards the order price.
///
/// Returns `None` when the order price equals the last fill (the distance is zero)
/// or the arithmetic overflows.
pub fn percent_completed(original: Decimal, market: Decimal, price: Decimal) -> Option<Decimal> {
    let hundred = Decimal::ONE_HUNDRED;
    let (travelled, distance) = if price > original {
        (market.checked_sub(original)?, price.checked_sub(original)?)
    } else {
        (original.checked_sub(market)?, original.checked_sub(price)?)
    };

    if distance.is_zero() {
        return None;
    }

    travelled
        .checked_mul(hundred)?
        .checked_div(distance)
        .map(|pct| pct.round_dp(2).normalize())
}

/// Render an optional metric, "N/A" when absent.
pub fn display_or_na(value: Option<Decimal>) -> String {
    value
        .map(|v| v.normalize().to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
