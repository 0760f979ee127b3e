use axum::{extract::State, http::StatusCode};
use tracing::warn;

use super::{error_response, ApiResult};
use crate::api::state::AppState;

pub const REFRESH_OK: &str =
    "Data successfully loaded from the exchange, the page could be reloaded.";

/// GET|POST /refresh
pub async fn trigger_refresh(State(state): State<AppState>) -> ApiResult<&'static str> {
    let summary = state.pipeline.run().await.map_err(error_response)?;

    if summary.alerts.has_failures() {
        let failures = summary
            .alerts
            .failed
            .iter()
            .map(|f| format!("{} ({}): {}", f.symbol, f.id, f.error))
            .collect::<Vec<_>>()
            .join("\n");
        warn!("refresh done but {} alerts were not delivered", summary.alerts.failed.len());
        return Err((
            StatusCode::BAD_GATEWAY,
            format!("Data loaded but some alerts could not be sent:\n{}", failures),
        ));
    }

    Ok(REFRESH_OK)
}
