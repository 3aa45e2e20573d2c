//! Controlador de acciones de despacho
//!
//! Acciones manuales sobre el ciclo de entrega de un vehículo. Cada acción
//! delega en el motor de despacho y envuelve el vehículo resultante en la
//! respuesta estándar de la API.

use uuid::Uuid;

use crate::dto::fleet_dto::ApiResponse;
use crate::models::Vehicle;
use crate::services::DispatchService;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub struct DispatchController {
    dispatch: DispatchService,
}

impl DispatchController {
    pub fn new(state: AppState) -> Self {
        Self {
            dispatch: state.dispatch(),
        }
    }

    pub async fn assign(
        &self,
        vehicle_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.dispatch.assign_order(vehicle_id, order_id).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Pedido asignado al vehículo".to_string(),
        ))
    }

    pub async fn start_route(&self, vehicle_id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.dispatch.start_route(vehicle_id).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo en ruta de recogida".to_string(),
        ))
    }

    pub async fn pickup(&self, vehicle_id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.dispatch.confirm_pickup(vehicle_id).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Paquete recogido".to_string(),
        ))
    }

    pub async fn delivering(&self, vehicle_id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.dispatch.start_delivering(vehicle_id).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo en camino de entrega".to_string(),
        ))
    }

    pub async fn delivered(
        &self,
        vehicle_id: Uuid,
        success: bool,
    ) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.dispatch.confirm_delivered(vehicle_id, success).await?;
        let message = if success {
            "Entrega completada exitosamente"
        } else {
            "Entrega completada con incidencias"
        };
        Ok(ApiResponse::success_with_message(
            vehicle,
            message.to_string(),
        ))
    }

    pub async fn fail(&self, vehicle_id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.dispatch.fail_delivery(vehicle_id).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Intento de entrega marcado como fallido".to_string(),
        ))
    }

    pub async fn cancel(&self, vehicle_id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.dispatch.cancel_delivery(vehicle_id).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Entrega cancelada".to_string(),
        ))
    }

    pub async fn available(&self, vehicle_id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.dispatch.set_available(vehicle_id).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo disponible".to_string(),
        ))
    }

    pub async fn complete_cycle(&self, vehicle_id: Uuid) -> AppResult<ApiResponse<Vehicle>> {
        let vehicle = self.dispatch.complete_delivery_cycle(vehicle_id).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "El ciclo de entrega ha sido completado exitosamente".to_string(),
        ))
    }
}
