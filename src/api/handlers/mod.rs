pub mod alerts;
pub mod dashboard;
pub mod refresh;

pub use alerts::*;
pub use dashboard::*;
pub use refresh::*;

use axum::http::StatusCode;
use tracing::error;

use crate::error::WatcherError;

pub type ApiResult<T> = std::result::Result<T, (StatusCode, String)>;

/// Map a failure to the status the dashboard sees
pub fn error_response(err: WatcherError) -> (StatusCode, String) {
    let status = match &err {
        WatcherError::Validation(_) | WatcherError::Json(_) => StatusCode::BAD_REQUEST,
        WatcherError::Http(_)
        | WatcherError::Exchange(_)
        | WatcherError::RateLimited(_)
        | WatcherError::Notification(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("request failed: {}", err);
    }
    (status, err.to_string())
}
