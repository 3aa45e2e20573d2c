//! Controlador de altas y listados de flota
//!
//! Alta administrativa mínima de vehículos y pedidos: lo justo para que el
//! motor tenga registros sobre los que operar. La pantalla CRUD completa
//! vive fuera de este servicio.

use std::sync::Arc;

use validator::Validate;

use crate::dto::fleet_dto::{ApiResponse, CreateOrderRequest, CreateVehicleRequest};
use crate::models::{DeliveryOrder, Vehicle};
use crate::repositories::FleetRepository;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

pub struct FleetController {
    store: Arc<dyn FleetRepository>,
}

impl FleetController {
    pub fn new(state: AppState) -> Self {
        Self { store: state.store }
    }

    pub async fn create_vehicle(
        &self,
        request: CreateVehicleRequest,
    ) -> AppResult<ApiResponse<Vehicle>> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut vehicle = Vehicle::new(request.internal_code, request.name);
        vehicle.driver_name = request.driver_name;
        vehicle.traccar_device_id = request.traccar_device_id;
        vehicle.traccar_unique_id = request.traccar_unique_id;

        let vehicle = self.store.create_vehicle(vehicle).await?;
        log::info!("🚗 Vehículo {} dado de alta", vehicle.internal_code);

        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo creado exitosamente".to_string(),
        ))
    }

    pub async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        self.store.list_vehicles().await
    }

    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> AppResult<ApiResponse<DeliveryOrder>> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let code = self.store.next_order_code().await?;
        let order = DeliveryOrder::new(
            code,
            request.pickup_address,
            request.delivery_address,
            request.customer_name,
            request.customer_phone,
            request.task_description,
        );

        let order = self.store.create_order(order).await?;
        log::info!("📦 Pedido {} creado", order.name);

        Ok(ApiResponse::success_with_message(
            order,
            "Pedido creado exitosamente".to_string(),
        ))
    }

    pub async fn list_orders(&self) -> AppResult<Vec<DeliveryOrder>> {
        self.store.list_orders().await
    }
}
