//! Rutas de flota, pedidos y acciones de despacho

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::dispatch_controller::DispatchController;
use crate::controllers::fleet_controller::FleetController;
use crate::dto::fleet_dto::{
    ApiResponse, AssignOrderRequest, ConfirmDeliveryRequest, CreateOrderRequest,
    CreateVehicleRequest,
};
use crate::models::{DeliveryOrder, Vehicle};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_vehicle))
        .route("/", get(list_vehicles))
        .route("/:id/assign", post(assign_order))
        .route("/:id/start-route", post(start_route))
        .route("/:id/pickup", post(pickup))
        .route("/:id/delivering", post(delivering))
        .route("/:id/delivered", post(delivered))
        .route("/:id/fail", post(fail))
        .route("/:id/cancel", post(cancel))
        .route("/:id/available", post(available))
        .route("/:id/complete-cycle", post(complete_cycle))
}

pub fn create_order_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/", get(list_orders))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = FleetController::new(state);
    Ok(Json(controller.create_vehicle(request).await?))
}

async fn list_vehicles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let controller = FleetController::new(state);
    Ok(Json(controller.list_vehicles().await?))
}

async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<ApiResponse<DeliveryOrder>>, AppError> {
    let controller = FleetController::new(state);
    Ok(Json(controller.create_order(request).await?))
}

async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<DeliveryOrder>>, AppError> {
    let controller = FleetController::new(state);
    Ok(Json(controller.list_orders().await?))
}

async fn assign_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignOrderRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = DispatchController::new(state);
    Ok(Json(controller.assign(id, request.order_id).await?))
}

async fn start_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = DispatchController::new(state);
    Ok(Json(controller.start_route(id).await?))
}

async fn pickup(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = DispatchController::new(state);
    Ok(Json(controller.pickup(id).await?))
}

async fn delivering(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = DispatchController::new(state);
    Ok(Json(controller.delivering(id).await?))
}

async fn delivered(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ConfirmDeliveryRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = DispatchController::new(state);
    Ok(Json(controller.delivered(id, request.success).await?))
}

async fn fail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = DispatchController::new(state);
    Ok(Json(controller.fail(id).await?))
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = DispatchController::new(state);
    Ok(Json(controller.cancel(id).await?))
}

async fn available(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = DispatchController::new(state);
    Ok(Json(controller.available(id).await?))
}

async fn complete_cycle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = DispatchController::new(state);
    Ok(Json(controller.complete_cycle(id).await?))
}
