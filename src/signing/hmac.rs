use crate::error::{Result, WatcherError};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use sha2::Sha256;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Header carrying the exchange API key on signed requests
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Exchange API credentials
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub secret: String,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("secret", &"***")
            .finish()
    }
}

/// Signs query strings for SIGNED exchange endpoints
#[derive(Clone, Debug)]
pub struct QuerySigner {
    credentials: ApiCredentials,
    recv_window_ms: u64,
}

impl QuerySigner {
    pub fn new(credentials: ApiCredentials, recv_window_ms: u64) -> Self {
        Self {
            credentials,
            recv_window_ms,
        }
    }

    /// Hex HMAC-SHA256 of `payload` under the API secret
    pub fn sign(&self, payload: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.credentials.secret.as_bytes())
            .map_err(|e| WatcherError::Signature(format!("HMAC init failed: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Build the full query for a signed request at `timestamp_ms`.
    ///
    /// `params` come first, then `recvWindow` and `timestamp`, then the
    /// signature over everything before it.
    pub fn signed_query_at(&self, params: &[(&str, &str)], timestamp_ms: i64) -> Result<String> {
        let mut query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        query.push(format!("recvWindow={}", self.recv_window_ms));
        query.push(format!("timestamp={}", timestamp_ms));

        let payload = query.join("&");
        let signature = self.sign(&payload)?;
        Ok(format!("{}&signature={}", payload, signature))
    }

    pub fn signed_query(&self, params: &[(&str, &str)]) -> Result<String> {
        self.signed_query_at(params, Utc::now().timestamp_millis())
    }

    /// Headers every signed request carries
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(&self.credentials.api_key)
                .map_err(|e| WatcherError::Auth(format!("Invalid API key header: {}", e)))?,
        );
        Ok(headers)
    }
}
