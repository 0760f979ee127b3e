use std::sync::Arc;

use crate::api::auth::AccessGate;
use crate::persistence::Store;
use crate::services::RefreshPipeline;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Snapshot and alert storage
    pub store: Arc<dyn Store>,

    /// Refresh pipeline shared with the scheduler
    pub pipeline: Arc<RefreshPipeline>,

    pub gate: Arc<AccessGate>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, pipeline: Arc<RefreshPipeline>, gate: Arc<AccessGate>) -> Self {
        Self {
            store,
            pipeline,
            gate,
        }
    }
}
