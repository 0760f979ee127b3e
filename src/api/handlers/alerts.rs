use axum::{extract::State, Json};
use tracing::info;

use super::{error_response, ApiResult};
use crate::api::state::AppState;
use crate::domain::NewAlert;

pub const ALERT_CREATED: &str = "Alert successfully created";

/// POST /alert
pub async fn create_alert(
    State(state): State<AppState>,
    Json(req): Json<NewAlert>,
) -> ApiResult<&'static str> {
    let alert = req.into_alert().map_err(error_response)?;
    state.store.add_alert(&alert).await.map_err(error_response)?;

    info!(id = %alert.id, symbol = %alert.symbol, price = %alert.price, "alert created");
    Ok(ALERT_CREATED)
}
