use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::error::Result;

/// Serve the dashboard until `shutdown` resolves.
///
/// Plain HTTP; TLS is terminated by the reverse proxy in front.
pub async fn start_api_server<F>(state: AppState, host: &str, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let listener = TcpListener::bind((host, port)).await?;
    info!("Dashboard listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    info!("Dashboard stopped");
    Ok(())
}
