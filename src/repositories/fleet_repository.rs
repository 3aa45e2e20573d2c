//! Repositorio de flota
//!
//! Interfaz estrecha sobre el almacén de registros externo. El motor nunca
//! retiene referencias entre operaciones: cada mutación lee el registro
//! actual, lo transforma y lo escribe completo de vuelta sosteniendo el
//! candado por-vehículo que entrega `vehicle_lock`. La implementación en
//! memoria sirve para tests y despliegues de un solo nodo; el almacén
//! durable de producción vive detrás de este trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::{DeliveryOrder, Vehicle};
use crate::utils::errors::{AppError, AppResult};

#[async_trait]
pub trait FleetRepository: Send + Sync {
    async fn create_vehicle(&self, vehicle: Vehicle) -> AppResult<Vehicle>;
    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn vehicle_by_device(&self, device_id: i64) -> AppResult<Option<Vehicle>>;
    async fn vehicle_by_code(&self, internal_code: &str) -> AppResult<Option<Vehicle>>;
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>>;
    /// Escribe el registro completo del vehículo (last-writer-wins a nivel
    /// de registro; el llamador debe sostener el candado del vehículo)
    async fn save_vehicle(&self, vehicle: Vehicle) -> AppResult<()>;
    /// Candado de mutación por-vehículo. Webhook, barrido y acciones
    /// manuales serializan sobre él; nunca se anida con otro candado.
    async fn vehicle_lock(&self, id: Uuid) -> Arc<Mutex<()>>;

    async fn create_order(&self, order: DeliveryOrder) -> AppResult<DeliveryOrder>;
    async fn get_order(&self, id: Uuid) -> AppResult<Option<DeliveryOrder>>;
    async fn list_orders(&self) -> AppResult<Vec<DeliveryOrder>>;
    async fn save_order(&self, order: DeliveryOrder) -> AppResult<()>;
    /// Pedidos en estado activo (assigned/on_route) vinculados al vehículo
    async fn active_orders_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<DeliveryOrder>>;
    async fn orders_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<DeliveryOrder>>;
    /// Reserva el siguiente código secuencial de pedido
    async fn next_order_code(&self) -> AppResult<String>;
}

/// Implementación en memoria del repositorio de flota
pub struct MemoryFleetRepository {
    vehicles: RwLock<HashMap<Uuid, Vehicle>>,
    orders: RwLock<HashMap<Uuid, DeliveryOrder>>,
    vehicle_locks: RwLock<HashMap<Uuid, Arc<Mutex<()>>>>,
    order_seq: AtomicU64,
}

impl MemoryFleetRepository {
    pub fn new() -> Self {
        Self {
            vehicles: RwLock::new(HashMap::new()),
            orders: RwLock::new(HashMap::new()),
            vehicle_locks: RwLock::new(HashMap::new()),
            order_seq: AtomicU64::new(0),
        }
    }
}

impl Default for MemoryFleetRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FleetRepository for MemoryFleetRepository {
    async fn create_vehicle(&self, vehicle: Vehicle) -> AppResult<Vehicle> {
        let mut vehicles = self.vehicles.write().await;
        if vehicles
            .values()
            .any(|v| v.internal_code == vehicle.internal_code)
        {
            return Err(AppError::Validation(format!(
                "El código RSExpress '{}' ya está registrado",
                vehicle.internal_code
            )));
        }
        vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn get_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.vehicles.read().await.get(&id).cloned())
    }

    async fn vehicle_by_device(&self, device_id: i64) -> AppResult<Option<Vehicle>> {
        Ok(self
            .vehicles
            .read()
            .await
            .values()
            .find(|v| v.traccar_device_id == Some(device_id))
            .cloned())
    }

    async fn vehicle_by_code(&self, internal_code: &str) -> AppResult<Option<Vehicle>> {
        Ok(self
            .vehicles
            .read()
            .await
            .values()
            .find(|v| v.internal_code == internal_code)
            .cloned())
    }

    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let mut vehicles: Vec<Vehicle> = self.vehicles.read().await.values().cloned().collect();
        vehicles.sort_by(|a, b| a.internal_code.cmp(&b.internal_code));
        Ok(vehicles)
    }

    async fn save_vehicle(&self, vehicle: Vehicle) -> AppResult<()> {
        let mut vehicles = self.vehicles.write().await;
        if !vehicles.contains_key(&vehicle.id) {
            return Err(AppError::NotFound(format!(
                "Vehículo '{}' no existe en el almacén",
                vehicle.id
            )));
        }
        vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }

    async fn vehicle_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
        {
            let locks = self.vehicle_locks.read().await;
            if let Some(lock) = locks.get(&id) {
                return lock.clone();
            }
        }
        let mut locks = self.vehicle_locks.write().await;
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn create_order(&self, order: DeliveryOrder) -> AppResult<DeliveryOrder> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> AppResult<Option<DeliveryOrder>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_orders(&self) -> AppResult<Vec<DeliveryOrder>> {
        let mut orders: Vec<DeliveryOrder> = self.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn save_order(&self, mut order: DeliveryOrder) -> AppResult<()> {
        order.write_date = Utc::now();
        let mut orders = self.orders.write().await;
        if !orders.contains_key(&order.id) {
            return Err(AppError::NotFound(format!(
                "Pedido '{}' no existe en el almacén",
                order.id
            )));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    async fn active_orders_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<DeliveryOrder>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.vehicle_id == Some(vehicle_id) && o.state.is_active())
            .cloned()
            .collect())
    }

    async fn orders_for_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<DeliveryOrder>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.vehicle_id == Some(vehicle_id))
            .cloned()
            .collect())
    }

    async fn next_order_code(&self) -> AppResult<String> {
        let seq = self.order_seq.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("RSX-{:05}", seq))
    }
}
