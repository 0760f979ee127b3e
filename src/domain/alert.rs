use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, WatcherError};

/// Mail recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

impl Recipient {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Price alert waiting for its threshold to be crossed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub symbol: String,
    /// Threshold price
    pub price: Decimal,
    pub name: String,
    pub email: String,
    /// Free-text note appended to the notification
    pub text: Option<String>,
    /// true: fire at or below the threshold, false: at or above
    pub direction_down: bool,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Whether `current` satisfies the alert's comparison
    pub fn is_triggered(&self, current: Decimal) -> bool {
        if self.direction_down {
            current <= self.price
        } else {
            current >= self.price
        }
    }

    pub fn recipient(&self) -> Recipient {
        Recipient::new(&self.name, &self.email)
    }

    /// Notification body for a firing alert
    pub fn message(&self, current: Decimal) -> String {
        let direction = if self.direction_down { "fell to" } else { "rose to" };
        let mut text = format!(
            "Order ALERT! {} price {} {} (alert threshold {})",
            self.symbol,
            direction,
            current.normalize(),
            self.price.normalize()
        );
        if let Some(note) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
            text.push_str("\n\nAdditional info: ");
            text.push_str(note);
        }
        text
    }
}

/// Alert as submitted by the dashboard
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub symbol: String,
    pub price: Decimal,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub direction_down: bool,
}

impl NewAlert {
    /// Validate the submission and assign it a fresh id.
    pub fn into_alert(self) -> Result<Alert> {
        let symbol = self.symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(WatcherError::Validation(format!(
                "invalid symbol '{}'",
                self.symbol
            )));
        }
        if self.price <= Decimal::ZERO {
            return Err(WatcherError::Validation(
                "price must be positive".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(WatcherError::Validation("name is required".to_string()));
        }
        let email = self.email.trim();
        if !email.contains('@') {
            return Err(WatcherError::Validation(format!(
                "invalid email '{}'",
                email
            )));
        }

        Ok(Alert {
            id: Uuid::new_v4(),
            symbol,
            price: self.price,
            name: self.name.trim().to_string(),
            email: email.to_string(),
            text: self.text.filter(|t| !t.trim().is_empty()),
            direction_down: self.direction_down,
            created_at: Utc::now(),
        })
    }
}
