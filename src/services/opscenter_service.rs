//! Agregación del OpsCenter
//!
//! Construcción del snapshot de flota para el dashboard. Lectura pura:
//! recibe las colecciones completas de vehículos y pedidos y no muta nada.
//! Toda sub-relación ausente (sin conductor, sin posición, sin pedido
//! activo) se sustituye por un placeholder definido en lugar de fallar.

use chrono::{DateTime, Utc};

use crate::dto::opscenter_dto::{OpsSnapshot, OrderBoardRow, VehicleBoardRow};
use crate::models::{DeliveryOrder, OperationalStatus, OrderState, Vehicle};

/// Construye el snapshot agregado del dashboard.
///
/// `day_start` delimita los KPI de "hoy" sobre `write_date`; el huso
/// horario del corte lo decide el llamador.
pub fn build_snapshot(
    vehicles: &[Vehicle],
    orders: &[DeliveryOrder],
    day_start: DateTime<Utc>,
) -> OpsSnapshot {
    let active_orders: Vec<&DeliveryOrder> = orders.iter().filter(|o| !o.state.is_closed()).collect();

    let completed_today = orders
        .iter()
        .filter(|o| o.state == OrderState::Delivered && o.write_date >= day_start)
        .count();
    let failed_today = orders
        .iter()
        .filter(|o| o.state == OrderState::Failed && o.write_date >= day_start)
        .count();

    let available_drivers = vehicles
        .iter()
        .filter(|v| v.operational_status == OperationalStatus::Available)
        .count();
    let busy_drivers = vehicles.len() - available_drivers;

    let vehicle_rows = vehicles
        .iter()
        .map(|vehicle| vehicle_row(vehicle, orders))
        .collect();

    let order_rows = active_orders
        .iter()
        .map(|order| order_row(order, vehicles))
        .collect();

    OpsSnapshot {
        kpi_total_orders: orders.len(),
        kpi_active_orders: active_orders.len(),
        kpi_completed_today: completed_today,
        kpi_failed_today: failed_today,
        kpi_available_drivers: available_drivers,
        kpi_busy_drivers: busy_drivers,
        vehicles: vehicle_rows,
        orders: order_rows,
    }
}

fn vehicle_row(vehicle: &Vehicle, orders: &[DeliveryOrder]) -> VehicleBoardRow {
    let active: Vec<&DeliveryOrder> = orders
        .iter()
        .filter(|o| o.vehicle_id == Some(vehicle.id) && o.state.is_active())
        .collect();
    if active.len() > 1 {
        log::warn!(
            "⚠️ Vehículo {} con {} pedidos activos simultáneos (corrupción aguas arriba)",
            vehicle.name,
            active.len()
        );
    }

    // KPI derivados de la relación de pedidos: ningún contador manual
    let completed = orders
        .iter()
        .filter(|o| o.vehicle_id == Some(vehicle.id) && o.state == OrderState::Delivered)
        .count();
    let failed = orders
        .iter()
        .filter(|o| o.vehicle_id == Some(vehicle.id) && o.state == OrderState::Failed)
        .count();
    let closed = completed + failed;
    let success_rate = if closed > 0 {
        (completed as f64 / closed as f64) * 100.0
    } else {
        0.0
    };

    VehicleBoardRow {
        id: vehicle.id,
        vehicle_name: vehicle.name.clone(),
        driver_name: vehicle
            .driver_name
            .clone()
            .unwrap_or_else(|| "Sin conductor".to_string()),
        state: vehicle.operational_status.as_str().to_string(),
        last_lat: vehicle.last_latitude.unwrap_or(0.0),
        last_lon: vehicle.last_longitude.unwrap_or(0.0),
        last_gps_ping: vehicle
            .last_gps_ping
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string()),
        active_delivery: active
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "Ninguna".to_string()),
        distance_today: vehicle.distance_today,
        orders_completed: completed,
        orders_failed: failed,
        success_rate,
    }
}

fn order_row(order: &DeliveryOrder, vehicles: &[Vehicle]) -> OrderBoardRow {
    let vehicle_name = order
        .vehicle_id
        .and_then(|id| vehicles.iter().find(|v| v.id == id))
        .map(|v| v.name.clone())
        .unwrap_or_else(|| "Sin asignar".to_string());

    OrderBoardRow {
        id: order.id,
        name: order.name.clone(),
        customer_name: order.customer_name.clone(),
        pickup: order.pickup_address.clone(),
        delivery: order.delivery_address.clone(),
        state: order.state.label().to_string(),
        state_raw: order.state.as_str().to_string(),
        vehicle: vehicle_name,
        customer_phone: order.customer_phone.clone(),
    }
}
