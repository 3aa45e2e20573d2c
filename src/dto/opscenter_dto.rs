//! DTOs del OpsCenter (dashboard operativo)

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Snapshot agregado de la flota para el dashboard
#[derive(Debug, Clone, Serialize)]
pub struct OpsSnapshot {
    pub kpi_total_orders: usize,
    pub kpi_active_orders: usize,
    pub kpi_completed_today: usize,
    pub kpi_failed_today: usize,
    pub kpi_available_drivers: usize,
    pub kpi_busy_drivers: usize,
    pub vehicles: Vec<VehicleBoardRow>,
    pub orders: Vec<OrderBoardRow>,
}

/// Fila de vehículo del tablero, estilo Uber Driver
#[derive(Debug, Clone, Serialize)]
pub struct VehicleBoardRow {
    pub id: Uuid,
    pub vehicle_name: String,
    pub driver_name: String,
    pub state: String,
    pub last_lat: f64,
    pub last_lon: f64,
    pub last_gps_ping: String,
    pub active_delivery: String,
    pub distance_today: f64,
    /// KPI derivados de la relación de pedidos del vehículo
    pub orders_completed: usize,
    pub orders_failed: usize,
    pub success_rate: f64,
}

/// Fila de pedido abierto del tablero
#[derive(Debug, Clone, Serialize)]
pub struct OrderBoardRow {
    pub id: Uuid,
    pub name: String,
    pub customer_name: String,
    pub pickup: String,
    pub delivery: String,
    /// Etiqueta legible del estado
    pub state: String,
    pub state_raw: String,
    pub vehicle: String,
    pub customer_phone: String,
}

/// Respuesta del endpoint de dashboard: snapshot + timestamp de servidor
#[derive(Debug, Clone, Serialize)]
pub struct OpsDataResponse {
    #[serde(flatten)]
    pub snapshot: OpsSnapshot,
    pub last_update: DateTime<Utc>,
}

/// Campos GPS actuales de un vehículo (endpoint de tracking puntual)
#[derive(Debug, Clone, Serialize)]
pub struct VehicleTrackingResponse {
    pub vehicle_id: Uuid,
    pub vehicle_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
    pub last_update: Option<DateTime<Utc>>,
    pub address: String,
    pub status: String,
    pub traccar_status: String,
    pub distance_today: f64,
}

/// Posiciones de toda la flota para el mapa
#[derive(Debug, Clone, Serialize)]
pub struct FleetMapResponse {
    pub vehicles: Vec<FleetMapRow>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FleetMapRow {
    pub id: Uuid,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub speed: f64,
    pub status: String,
    pub driver: String,
    pub last_update: Option<DateTime<Utc>>,
}
