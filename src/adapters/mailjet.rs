//! Mailjet transactional mail
//!
//! Sends alert and lockout notifications through the v3.1 send API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

use crate::config::MailerConfig;
use crate::domain::Recipient;
use crate::error::{Result, WatcherError};
use crate::notify::Notifier;

/// Mailjet notification client
#[derive(Clone)]
pub struct MailjetNotifier {
    client: Client,
    endpoint: String,
    api_key: String,
    api_secret: String,
    sender: Recipient,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendRequest<'a> {
    messages: Vec<MailMessage<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MailMessage<'a> {
    from: Address<'a>,
    to: Vec<Address<'a>>,
    subject: &'a str,
    text_part: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Address<'a> {
    email: &'a str,
    name: &'a str,
}

impl<'a> From<&'a Recipient> for Address<'a> {
    fn from(r: &'a Recipient) -> Self {
        Self {
            email: &r.email,
            name: &r.name,
        }
    }
}

impl MailjetNotifier {
    pub fn new(config: &MailerConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            WatcherError::Internal(format!("failed to build mail HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            endpoint: format!("{}/v3.1/send", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            sender: Recipient::new(&config.sender_name, &config.sender_email),
        })
    }
}

#[async_trait]
impl Notifier for MailjetNotifier {
    async fn send(&self, to: &Recipient, subject: &str, text: &str) -> Result<()> {
        let request = SendRequest {
            messages: vec![MailMessage {
                from: (&self.sender).into(),
                to: vec![to.into()],
                subject,
                text_part: text,
            }],
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Mailjet request failed: {}", e);
                WatcherError::Notification(e.to_string())
            })?;

        let status = resp.status();
        if status.is_success() {
            debug!(to = %to.email, "Mailjet message accepted");
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            error!("Mailjet send failed: {} - {}", status, body);
            Err(WatcherError::Notification(format!(
                "HTTP {}: {}",
                status, body
            )))
        }
    }
}
