//! Modelo de DeliveryOrder
//!
//! Pedido de entrega RSExpress. Los campos del pedido (direcciones, cliente,
//! descripción) son inmutables tras la creación; el motor solo muta `state`,
//! el vínculo con el vehículo y `write_date`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Estado del pedido de entrega
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    New,
    Assigned,
    OnRoute,
    Delivered,
    Failed,
    Cancelled,
}

impl OrderState {
    pub fn label(&self) -> &'static str {
        match self {
            OrderState::New => "Nuevo",
            OrderState::Assigned => "Asignado",
            OrderState::OnRoute => "En Ruta",
            OrderState::Delivered => "Entregado",
            OrderState::Failed => "Fallido",
            OrderState::Cancelled => "Cancelado",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::New => "new",
            OrderState::Assigned => "assigned",
            OrderState::OnRoute => "on_route",
            OrderState::Delivered => "delivered",
            OrderState::Failed => "failed",
            OrderState::Cancelled => "cancelled",
        }
    }

    /// Un pedido activo es el que todavía requiere un vehículo asignado
    pub fn is_active(&self) -> bool {
        matches!(self, OrderState::Assigned | OrderState::OnRoute)
    }

    /// Estados que ya no cuentan para el tablero de pedidos abiertos
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            OrderState::Delivered | OrderState::Failed | OrderState::Cancelled
        )
    }
}

/// Pedido de entrega
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOrder {
    pub id: Uuid,
    /// Código secuencial generado (RSX-00001, RSX-00002, ...)
    pub name: String,
    pub pickup_address: String,
    pub delivery_address: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub task_description: String,
    pub state: OrderState,
    pub vehicle_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Última modificación; los KPI de "hoy" filtran sobre este campo
    pub write_date: DateTime<Utc>,
}

impl DeliveryOrder {
    pub fn new(
        name: String,
        pickup_address: String,
        delivery_address: String,
        customer_name: String,
        customer_phone: String,
        task_description: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            pickup_address,
            delivery_address,
            customer_name,
            customer_phone,
            task_description,
            state: OrderState::New,
            vehicle_id: None,
            created_at: now,
            write_date: now,
        }
    }
}
