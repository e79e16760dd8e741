use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::service::GraphService;

pub mod routes;

/// Server state
pub struct AppState {
    pub service: Arc<GraphService>,
}

/// Build the HTTP router over a running service
pub fn router(service: Arc<GraphService>) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/ingest", post(routes::ingest))
        .route("/query", post(routes::query))
        .route("/entity/{id}", get(routes::get_entity))
        .route("/lookup", get(routes::lookup))
        .route("/stats", get(routes::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(addr: SocketAddr, service: Arc<GraphService>) -> anyhow::Result<()> {
    let app = router(service);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
