use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use chrono::Utc;
use hmac::Mac;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::hmac::HmacSha256;
use crate::error::{Result, WatcherError};

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Payload of a dashboard session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Random session id
    pub id: String,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expires at, unix seconds
    pub exp: i64,
}

/// Issues and verifies stateless HS256 session tokens
#[derive(Clone)]
pub struct SessionSigner {
    secret: Vec<u8>,
    ttl_secs: u64,
}

impl SessionSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl_secs: u64) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// HMAC keyed with the session secret
    pub(crate) fn keyed_mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| WatcherError::Signature(format!("HMAC init failed: {}", e)))
    }

    /// Issue a token valid from `now` (unix seconds)
    pub fn issue_at(&self, now: i64) -> Result<String> {
        let ttl = i64::try_from(self.ttl_secs).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            id: Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
        };
        let header = TokenHeader {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };

        let signing_input = format!(
            "{}.{}",
            BASE64_URL.encode(serde_json::to_vec(&header)?),
            BASE64_URL.encode(serde_json::to_vec(&claims)?)
        );

        let mut mac = self.keyed_mac()?;
        mac.update(signing_input.as_bytes());
        let signature = BASE64_URL.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    pub fn issue(&self) -> Result<String> {
        self.issue_at(Utc::now().timestamp())
    }

    /// Check signature, algorithm and expiry as of `now`
    pub fn verify_at(&self, token: &str, now: i64) -> Result<SessionClaims> {
        let mut parts = token.trim().split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(WatcherError::Auth("malformed session token".to_string()));
        };

        let header: TokenHeader = decode_segment(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(WatcherError::Auth(format!(
                "unexpected token algorithm {}",
                header.alg
            )));
        }

        let signature = BASE64_URL
            .decode(signature_b64)
            .map_err(|_| WatcherError::Auth("malformed token signature".to_string()))?;
        let mut mac = self.keyed_mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| WatcherError::Auth("bad token signature".to_string()))?;

        let claims: SessionClaims = decode_segment(claims_b64)?;
        if claims.exp <= now {
            return Err(WatcherError::Auth("session token expired".to_string()));
        }

        Ok(claims)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        self.verify_at(token, Utc::now().timestamp())
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T> {
    let bytes = BASE64_URL
        .decode(segment)
        .map_err(|_| WatcherError::Auth("malformed token segment".to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| WatcherError::Auth("malformed token segment".to_string()))
}
