//! DTOs de alta y consulta de flota y pedidos

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request para dar de alta un vehículo/mensajero
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    /// Código interno único del vehículo (Código RSExpress)
    #[validate(length(min = 1, max = 32))]
    pub internal_code: String,

    #[validate(length(min = 1, max = 100))]
    pub name: String,

    pub driver_name: Option<String>,

    /// ID del dispositivo GPS en Traccar Server
    pub traccar_device_id: Option<i64>,

    /// IMEI o identificador único del dispositivo GPS
    pub traccar_unique_id: Option<String>,
}

/// Request para crear un pedido de entrega
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 200))]
    pub pickup_address: String,

    #[validate(length(min = 1, max = 200))]
    pub delivery_address: String,

    #[validate(length(min = 1, max = 100))]
    pub customer_name: String,

    #[validate(length(min = 1, max = 30))]
    pub customer_phone: String,

    #[validate(length(min = 1))]
    pub task_description: String,
}

/// Request de asignación de pedido a vehículo
#[derive(Debug, Deserialize)]
pub struct AssignOrderRequest {
    pub order_id: Uuid,
}

/// Request de confirmación de entrega
#[derive(Debug, Deserialize)]
pub struct ConfirmDeliveryRequest {
    /// `true` si exitosa, `false` si con incidencias
    pub success: bool,
}

/// Response genérica
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}
