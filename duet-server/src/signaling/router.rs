use crate::hub::HubSnapshot;
use crate::signaling::{SignalingService, ws_handler};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

pub fn router(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/peers", get(peers_handler))
        .layer(cors)
        .with_state(service)
}

async fn peers_handler(
    State(service): State<SignalingService>,
) -> Result<Json<HubSnapshot>, StatusCode> {
    service.snapshot().await.map(Json).map_err(|e| {
        error!("Snapshot failed: {:#}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })
}
