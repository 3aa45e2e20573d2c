//! Rutas de la API

pub mod fleet_routes;
pub mod opscenter_routes;

use axum::{middleware::from_fn_with_state, response::Json, routing::get, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::middleware::{cors_middleware, require_api_key};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Ensambla el router completo de la aplicación
pub fn create_app(state: AppState) -> Router {
    // Endpoints bajo sesión: dashboard, tracking, acciones de despacho
    let protected = Router::new()
        .nest("/rsexpress", opscenter_routes::create_opscenter_router())
        .nest("/api/vehicle", fleet_routes::create_vehicle_router())
        .nest("/api/order", fleet_routes::create_order_router())
        .route_layer(from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/test", get(test_endpoint))
        .route("/metrics", get(metrics_endpoint))
        // webhook público: push servidor-a-servidor sin sesión
        .nest("/rsexpress", opscenter_routes::create_webhook_router())
        .merge(protected)
        .layer(cors_middleware(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Endpoint de prueba simple
async fn test_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "message": "¡Backend de despacho RSExpress funcionando correctamente!",
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Exposición de métricas Prometheus
async fn metrics_endpoint(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<String, AppError> {
    state.metrics.render()
}
