use axum::{
    extract::{ConnectInfo, Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE, SET_COOKIE, WWW_AUTHENTICATE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::Mac;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::api::state::AppState;
use crate::config::AuthConfig;
use crate::domain::Recipient;
use crate::error::Result;
use crate::notify::Notifier;
use crate::persistence::Store;
use crate::signing::SessionSigner;

pub const SESSION_COOKIE: &str = "access_token";
pub const BEARER_PREFIX: &str = "Bearer ";
pub const BASIC_CHALLENGE: &str = r#"Basic realm="restricted", charset="UTF-8""#;
pub const UNKNOWN_SOURCE: &str = "unknown";

const LOCKOUT_SUBJECT: &str = "Dashboard access blocked";

/// Gate decision for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Valid session cookie
    Session,
    /// Correct credentials; the new token goes back as a cookie
    Granted { token: String },
    /// Missing or wrong credentials
    Challenge,
    /// Source is locked out
    Forbidden,
}

/// Basic-auth to session-token exchange with per-source lockout
pub struct AccessGate {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    signer: SessionSigner,
    username: String,
    password: String,
    max_attempts: u32,
    admin: Recipient,
}

impl AccessGate {
    pub fn new(config: &AuthConfig, store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            signer: SessionSigner::new(&config.secret, config.token_ttl_secs),
            username: config.username.clone(),
            password: config.password.clone(),
            max_attempts: config.max_attempts,
            admin: Recipient::new(&config.admin_name, &config.admin_email),
        }
    }

    pub fn signer(&self) -> &SessionSigner {
        &self.signer
    }

    /// Decide whether the request from `source` may proceed
    pub async fn authorize(&self, source: &str, headers: &HeaderMap) -> Result<Access> {
        if let Some(token) = session_token(headers) {
            match self.signer.verify(&token) {
                Ok(_) => return Ok(Access::Session),
                Err(e) => debug!(source, "session cookie rejected: {}", e),
            }
        }

        // attempt is spent before the credentials are checked; success resets it
        let Some(attempts) = self
            .store
            .reserve_auth_attempt(source, self.max_attempts)
            .await?
        else {
            self.notify_lockout(source).await?;
            return Ok(Access::Forbidden);
        };

        let matched = basic_credentials(headers)
            .map(|(user, pass)| self.credentials_match(&user, &pass))
            .unwrap_or(false);

        if !matched {
            warn!(source, attempts, "dashboard credential challenge failed");
            return Ok(Access::Challenge);
        }

        self.store.reset_auth_attempts(source).await?;
        let token = self.signer.issue()?;
        info!(source, "dashboard session issued");
        Ok(Access::Granted { token })
    }

    fn credentials_match(&self, user: &str, pass: &str) -> bool {
        // evaluate both so timing does not reveal which one differed
        let user_ok = constant_time_eq(&self.signer, user, &self.username);
        let pass_ok = constant_time_eq(&self.signer, pass, &self.password);
        user_ok & pass_ok
    }

    /// Tell the administrator about a lockout, once per lockout
    async fn notify_lockout(&self, source: &str) -> Result<()> {
        if !self.store.claim_lockout_notification(source).await? {
            return Ok(());
        }

        let text = format!(
            "Dashboard access from {} is blocked: {} failed login attempts.",
            source, self.max_attempts
        );
        match self.notifier.send(&self.admin, LOCKOUT_SUBJECT, &text).await {
            Ok(()) => warn!(source, "source locked out, administrator notified"),
            Err(e) => {
                error!(source, "lockout notification failed: {}", e);
                self.store.release_lockout_notification(source).await?;
            }
        }
        Ok(())
    }

    /// `Set-Cookie` value carrying a freshly issued token
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}{}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
            SESSION_COOKIE,
            BEARER_PREFIX,
            token,
            self.signer.ttl_secs()
        )
    }
}

/// Compare two secrets through HMAC tags so the comparison is constant time
fn constant_time_eq(signer: &SessionSigner, provided: &str, expected: &str) -> bool {
    let tag = |value: &str| -> Option<crate::signing::hmac::HmacSha256> {
        let mut mac = signer.keyed_mac().ok()?;
        mac.update(value.as_bytes());
        Some(mac)
    };
    match (tag(expected), tag(provided)) {
        (Some(expected), Some(provided)) => {
            let expected = expected.finalize().into_bytes();
            provided.verify_slice(&expected).is_ok()
        }
        _ => false,
    }
}

fn extract_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .find_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?.trim();
            let value = parts.next()?.trim();
            if key == cookie_name {
                Some(value.to_string())
            } else {
                None
            }
        })
}

/// Token from the `access_token` cookie, prefix stripped
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let raw = extract_cookie(headers, SESSION_COOKIE)?;
    let raw = raw.trim_matches('"');
    let token = raw.strip_prefix(BEARER_PREFIX).unwrap_or(raw).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Decode `Authorization: Basic <base64(user:pass)>`
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, encoded) = raw.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Client address as seen through the reverse proxy
pub fn client_source(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(real_ip) = header("x-real-ip") {
        return real_ip.to_string();
    }
    if let Some(first) = header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
}

fn challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, BASIC_CHALLENGE)],
        "Unauthorised.\n",
    )
        .into_response()
}

/// Middleware guarding every dashboard route
pub async fn require_access(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let headers = request.headers().clone();
    let source = client_source(&headers, peer);

    let access = match state.gate.authorize(&source, &headers).await {
        Ok(access) => access,
        Err(e) => {
            error!(source = %source, "access check failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error.\n").into_response();
        }
    };

    match access {
        Access::Session => next.run(request).await,
        Access::Forbidden => (StatusCode::FORBIDDEN, "Forbidden.\n").into_response(),
        Access::Challenge => challenge(),
        Access::Granted { token } => {
            let cookie = state.gate.session_cookie(&token);
            let mut response = next.run(request).await;
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => error!("failed to build session cookie: {}", e),
            }
            response
        }
    }
}
