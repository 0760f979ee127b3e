use axum::{extract::State, Json};
use serde::Serialize;

use super::{error_response, ApiResult};
use crate::api::state::AppState;
use crate::domain::{Alert, EnrichedOrder, PriceTick};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub orders: Vec<EnrichedOrder>,
    pub prices: Vec<PriceTick>,
    pub alerts: Vec<Alert>,
}

/// GET /
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardResponse>> {
    let orders = state.store.orders().await.map_err(error_response)?;
    let prices = state.store.prices().await.map_err(error_response)?;
    let alerts = state.store.alerts().await.map_err(error_response)?;

    Ok(Json(DashboardResponse {
        orders,
        prices,
        alerts,
    }))
}
