use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::api::{auth::require_access, handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::get_dashboard))
        .route(
            "/refresh",
            get(handlers::trigger_refresh).post(handlers::trigger_refresh),
        )
        .route("/alert", post(handlers::create_alert))
        // every route sits behind the access gate
        .route_layer(middleware::from_fn_with_state(state.clone(), require_access))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
