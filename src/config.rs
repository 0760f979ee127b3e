use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub exchange: ExchangeConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub mailer: MailerConfig,
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind the dashboard on
    pub host: String,
    /// Dashboard port
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// REST endpoint (e.g. "https://api.binance.com")
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Signed request validity window in milliseconds
    #[serde(default = "default_recv_window")]
    pub recv_window_ms: u64,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_recv_window() -> u64 {
    10_000
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    /// HMAC key for session tokens
    pub secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    /// Failed challenges tolerated per source before lockout
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Recipient of lockout notifications
    pub admin_name: String,
    pub admin_email: String,
}

fn default_token_ttl() -> u64 {
    84_600
}

fn default_max_attempts() -> u32 {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailerConfig {
    #[serde(default = "default_mailer_url")]
    pub base_url: String,
    /// Leave empty to log notifications instead of mailing them
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub sender_email: String,
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Per-request timeout for the mail API, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_mailer_url() -> String {
    "https://api.mailjet.com".to_string()
}

fn default_subject() -> String {
    "Order Alert".to_string()
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            base_url: default_mailer_url(),
            api_key: String::new(),
            api_secret: String::new(),
            sender_name: String::new(),
            sender_email: String::new(),
            subject: default_subject(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MailerConfig {
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.api_secret.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between pipeline runs
    pub interval_secs: u64,
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rolling log files
    #[serde(default)]
    pub dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("exchange.base_url", "https://api.binance.com")?
            .set_default("exchange.recv_window_ms", default_recv_window() as i64)?
            .set_default("exchange.timeout_secs", default_timeout_secs() as i64)?
            .set_default("mailer.timeout_secs", default_timeout_secs() as i64)?
            .set_default("auth.token_ttl_secs", default_token_ttl() as i64)?
            .set_default("auth.max_attempts", default_max_attempts() as i64)?
            .set_default("database.url", "sqlite://order-watch.db")?
            .set_default("database.max_connections", default_max_connections() as i64)?
            .set_default("scheduler.interval_secs", 30 * 60)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Environment-specific overrides (e.g. config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("WATCHER_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // WATCHER_AUTH__PASSWORD, WATCHER_EXCHANGE__API_KEY, ...
            .add_source(
                Environment::with_prefix("WATCHER")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.exchange.api_key.trim().is_empty() || self.exchange.api_secret.trim().is_empty() {
            errors.push("exchange.api_key and exchange.api_secret are required".to_string());
        }

        if self.auth.username.is_empty() || self.auth.password.is_empty() {
            errors.push("auth.username and auth.password are required".to_string());
        }

        if self.auth.secret.len() < 16 {
            errors.push("auth.secret must be at least 16 bytes".to_string());
        }

        if self.auth.max_attempts == 0 {
            errors.push("auth.max_attempts must be positive".to_string());
        }

        if self.auth.token_ttl_secs == 0 {
            errors.push("auth.token_ttl_secs must be positive".to_string());
        }

        if !self.auth.admin_email.contains('@') {
            errors.push("auth.admin_email must be an email address".to_string());
        }

        if self.mailer.is_enabled() && !self.mailer.sender_email.contains('@') {
            errors.push("mailer.sender_email is required when the mailer is enabled".to_string());
        }

        if self.mailer.timeout_secs == 0 {
            errors.push("mailer.timeout_secs must be positive".to_string());
        }

        if self.scheduler.interval_secs == 0 {
            errors.push("scheduler.interval_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            exchange: ExchangeConfig {
                base_url: "https://api.binance.com".to_string(),
                api_key: "key".to_string(),
                api_secret: "secret".to_string(),
                recv_window_ms: 10_000,
                timeout_secs: 30,
            },
            auth: AuthConfig {
                username: "admin".to_string(),
                password: "hunter2".to_string(),
                secret: "0123456789abcdef0123".to_string(),
                token_ttl_secs: 84_600,
                max_attempts: 3,
                admin_name: "Ops".to_string(),
                admin_email: "ops@example.com".to_string(),
            },
            mailer: MailerConfig::default(),
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            scheduler: SchedulerConfig { interval_secs: 1800 },
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let mut cfg = sample();
        cfg.auth.secret = "short".to_string();
        cfg.auth.max_attempts = 0;
        cfg.scheduler.interval_secs = 0;
        cfg.mailer.timeout_secs = 0;

        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_enabled_mailer_needs_sender() {
        let mut cfg = sample();
        cfg.mailer.api_key = "k".to_string();
        cfg.mailer.api_secret = "s".to_string();
        assert!(cfg.validate().is_err());

        cfg.mailer.sender_email = "bot@example.com".to_string();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_fills_defaults_around_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("default.toml"),
            r#"
[exchange]
api_key = "file-key"
api_secret = "file-secret"

[auth]
username = "admin"
password = "pw"
secret = "0123456789abcdef"
admin_name = "Ops"
admin_email = "ops@example.com"
"#,
        )
        .expect("write config");

        let cfg = AppConfig::load_from(dir.path()).expect("config should load");
        assert_eq!(cfg.exchange.api_key, "file-key");
        assert_eq!(cfg.exchange.recv_window_ms, 10_000);
        assert_eq!(cfg.auth.max_attempts, 3);
        assert_eq!(cfg.auth.token_ttl_secs, 84_600);
        assert_eq!(cfg.scheduler.interval(), Duration::from_secs(1800));
        assert!(!cfg.mailer.is_enabled());
        assert_eq!(cfg.mailer.timeout_secs, 30);
    }

    #[test]
    fn test_mailer_timeout_is_independent_of_exchange() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("default.toml"),
            r#"
[exchange]
api_key = "file-key"
api_secret = "file-secret"
timeout_secs = 45

[auth]
username = "admin"
password = "pw"
secret = "0123456789abcdef"
admin_name = "Ops"
admin_email = "ops@example.com"

[mailer]
timeout_secs = 7
"#,
        )
        .expect("write config");

        let cfg = AppConfig::load_from(dir.path()).expect("config should load");
        assert_eq!(cfg.exchange.timeout_secs, 45);
        assert_eq!(cfg.mailer.timeout_secs, 7);
    }
}
