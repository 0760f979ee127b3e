//! Outbound notifications (price alerts, lockout warnings)

use async_trait::async_trait;
use tracing::warn;

use crate::domain::Recipient;
use crate::error::Result;

/// Delivers a plain-text message to one recipient
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &Recipient, subject: &str, text: &str) -> Result<()>;
}

/// Fallback used when no mail credentials are configured
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &Recipient, subject: &str, text: &str) -> Result<()> {
        warn!(
            to = %to.email,
            subject,
            "mailer disabled, notification logged only: {}",
            text
        );
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::error::WatcherError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// One captured notification
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentMessage {
        pub to: Recipient,
        pub subject: String,
        pub text: String,
    }

    /// Notifier that records what it was asked to send
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<SentMessage>>,
        failing: AtomicBool,
        delay: Duration,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            let notifier = Self::default();
            notifier.set_failing(true);
            notifier
        }

        /// Each send waits `delay` before it is recorded
        pub fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn sent(&self) -> Vec<SentMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, to: &Recipient, subject: &str, text: &str) -> Result<()> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(WatcherError::Notification("mail relay down".to_string()));
            }
            self.sent.lock().unwrap().push(SentMessage {
                to: to.clone(),
                subject: subject.to_string(),
                text: text.to_string(),
            });
            Ok(())
        }
    }
}
