use chrono::{DateTime, Utc};
use serde::Serialize;

/// Failed-challenge bookkeeping for one request source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthAttemptRecord {
    /// Client address as seen through the proxy headers
    pub source: String,
    pub attempts: u32,
    /// Whether the administrator has been told about the lockout
    pub alert_sent: bool,
    pub updated_at: DateTime<Utc>,
}

impl AuthAttemptRecord {
    pub fn is_locked(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }
}
