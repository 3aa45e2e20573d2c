//! Rutas del OpsCenter y del webhook de Traccar

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::opscenter_controller::OpsCenterController;
use crate::dto::opscenter_dto::{FleetMapResponse, OpsDataResponse, VehicleTrackingResponse};
use crate::dto::webhook_dto::{TraccarWebhookPayload, WebhookAck};
use crate::services::sync_service::SweepSummary;
use crate::services::traccar_client::ConnectionTestResult;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Rutas autenticadas del dashboard (guardia de API key aplicada aparte)
pub fn create_opscenter_router() -> Router<AppState> {
    Router::new()
        .route("/opscenter/data", get(ops_data))
        .route("/opscenter/tracking", get(fleet_map))
        .route("/opscenter/tracking/:vehicle_id", get(vehicle_tracking))
        .route("/traccar/test", get(traccar_test))
        .route("/sync", post(trigger_sync))
}

/// Webhook público de Traccar (push servidor-a-servidor, sin sesión)
pub fn create_webhook_router() -> Router<AppState> {
    Router::new().route("/traccar/webhook", post(traccar_webhook))
}

async fn ops_data(State(state): State<AppState>) -> Result<Json<OpsDataResponse>, AppError> {
    let controller = OpsCenterController::new(state);
    Ok(Json(controller.ops_data().await?))
}

async fn vehicle_tracking(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<VehicleTrackingResponse>, AppError> {
    let controller = OpsCenterController::new(state);
    Ok(Json(controller.vehicle_tracking(vehicle_id).await?))
}

async fn fleet_map(State(state): State<AppState>) -> Result<Json<FleetMapResponse>, AppError> {
    let controller = OpsCenterController::new(state);
    Ok(Json(controller.fleet_map().await?))
}

async fn traccar_test(State(state): State<AppState>) -> Json<ConnectionTestResult> {
    let controller = OpsCenterController::new(state);
    Json(controller.traccar_test().await)
}

async fn trigger_sync(State(state): State<AppState>) -> Result<Json<SweepSummary>, AppError> {
    let controller = OpsCenterController::new(state);
    Ok(Json(controller.trigger_sweep().await?))
}

/// El webhook responde SIEMPRE un acuse estructurado: también ante un body
/// que ni siquiera parsea.
async fn traccar_webhook(
    State(state): State<AppState>,
    payload: Result<Json<TraccarWebhookPayload>, JsonRejection>,
) -> Json<WebhookAck> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            log::warn!("⚠️ Webhook con payload inválido: {}", rejection);
            return Json(WebhookAck::error(format!(
                "Payload inválido: {}",
                rejection
            )));
        }
    };

    Json(state.webhook().ingest(payload).await)
}
