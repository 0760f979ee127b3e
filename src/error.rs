use thiserror::Error;

/// Main error type for the order watcher
#[derive(Error, Debug)]
pub enum WatcherError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Exchange error: {0}")]
    Exchange(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid stored data: {0}")]
    Corrupt(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Signature error: {0}")]
    Signature(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WatcherError {
    /// Upstream failures that the next scheduled cycle may clear on its own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WatcherError::Http(_) | WatcherError::Exchange(_) | WatcherError::RateLimited(_)
        )
    }
}

/// Result type alias for WatcherError
pub type Result<T> = std::result::Result<T, WatcherError>;
