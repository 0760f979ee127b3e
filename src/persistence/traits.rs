use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Alert, AuthAttemptRecord, EnrichedOrder, PriceTick};
use crate::error::Result;

/// Record store shared by the refresh pipeline and the dashboard
#[async_trait]
pub trait Store: Send + Sync {
    // ==================== Snapshot ====================

    /// Replace the stored orders and prices as one unit.
    ///
    /// Readers observe either the previous snapshot or the new one.
    async fn replace_snapshot(&self, orders: &[EnrichedOrder], prices: &[PriceTick]) -> Result<()>;

    async fn orders(&self) -> Result<Vec<EnrichedOrder>>;

    async fn prices(&self) -> Result<Vec<PriceTick>>;

    // ==================== Alerts ====================

    async fn add_alert(&self, alert: &Alert) -> Result<()>;

    /// Pending alerts, oldest first
    async fn alerts(&self) -> Result<Vec<Alert>>;

    /// Returns false when the alert was already gone
    async fn delete_alert(&self, id: Uuid) -> Result<bool>;

    // ==================== Auth attempts ====================

    async fn auth_attempt(&self, source: &str) -> Result<Option<AuthAttemptRecord>>;

    /// Take one login attempt for `source`, creating its record if needed.
    ///
    /// Returns the new count, or `None` once `max_attempts` are used up.
    /// The check and the increment are a single statement, so concurrent
    /// requests can never take more than `max_attempts` between them.
    async fn reserve_auth_attempt(&self, source: &str, max_attempts: u32) -> Result<Option<u32>>;

    /// Zero the counter and the lockout flag after a successful login
    async fn reset_auth_attempts(&self, source: &str) -> Result<()>;

    /// Set the lockout flag if it is clear. Only the caller that gets `true`
    /// should notify the administrator.
    async fn claim_lockout_notification(&self, source: &str) -> Result<bool>;

    /// Clear the lockout flag again after a notification could not be sent
    async fn release_lockout_notification(&self, source: &str) -> Result<()>;

    /// Drop the record entirely (manual unlock). Returns false if none existed
    async fn clear_auth_source(&self, source: &str) -> Result<bool>;
}
