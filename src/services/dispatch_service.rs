//! Motor de despacho
//!
//! Máquina de estados operativa del par vehículo/pedido y acumulación de
//! distancia GPS. Toda mutación sigue el mismo contrato: tomar el candado
//! del vehículo, leer el registro actual, aplicar la transición vigilada y
//! escribir el registro completo de vuelta. Las transiciones terminales
//! encolan la notificación al cliente sin condicionar su propio commit.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::metrics::Metrics;
use crate::models::{DeliveryOrder, LinkStatus, OperationalStatus, OrderState, Position, Vehicle};
use crate::repositories::FleetRepository;
use crate::services::notification_service::{CustomerNotification, NotificationService};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::geo;
use crate::utils::validation::validate_coordinates;

/// Umbral en km a partir del cual un salto entre posiciones consecutivas
/// se registra como evento de auditoría
const JUMP_AUDIT_THRESHOLD_KM: f64 = 1.0;

#[derive(Clone)]
pub struct DispatchService {
    store: Arc<dyn FleetRepository>,
    notifier: NotificationService,
    metrics: Arc<Metrics>,
}

impl DispatchService {
    pub fn new(
        store: Arc<dyn FleetRepository>,
        notifier: NotificationService,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            notifier,
            metrics,
        }
    }

    async fn load_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        self.store
            .get_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehículo '{}' no encontrado", vehicle_id)))
    }

    /// Pedido activo vinculado al vehículo.
    ///
    /// Más de un pedido activo simultáneo es corrupción de datos aguas
    /// arriba: se reporta como error de integridad.
    pub async fn active_order(&self, vehicle_id: Uuid) -> AppResult<Option<DeliveryOrder>> {
        let mut active = self.store.active_orders_for_vehicle(vehicle_id).await?;
        match active.len() {
            0 => Ok(None),
            1 => Ok(active.pop()),
            n => Err(AppError::Integrity(format!(
                "El vehículo '{}' tiene {} pedidos activos simultáneos",
                vehicle_id, n
            ))),
        }
    }

    // ==================== TRANSICIONES DE ESTADO ====================

    /// available → assigned: vincula el pedido al vehículo
    pub async fn assign_order(&self, vehicle_id: Uuid, order_id: Uuid) -> AppResult<Vehicle> {
        let lock = self.store.vehicle_lock(vehicle_id).await;
        let _guard = lock.lock().await;

        let mut vehicle = self.load_vehicle(vehicle_id).await?;
        if vehicle.operational_status != OperationalStatus::Available {
            return Err(AppError::Validation(
                "El vehículo debe estar disponible para ser asignado".to_string(),
            ));
        }
        if vehicle.driver_name.is_none() {
            return Err(AppError::Validation(
                "El vehículo no tiene mensajero asignado".to_string(),
            ));
        }
        if self.active_order(vehicle_id).await?.is_some() {
            return Err(AppError::Validation(
                "El vehículo ya tiene un pedido activo vinculado".to_string(),
            ));
        }

        let mut order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pedido '{}' no encontrado", order_id)))?;
        if order.state != OrderState::New {
            return Err(AppError::Validation(format!(
                "El pedido {} no está en estado 'nuevo'",
                order.name
            )));
        }

        order.state = OrderState::Assigned;
        order.vehicle_id = Some(vehicle_id);
        vehicle.operational_status = OperationalStatus::Assigned;

        self.store.save_order(order.clone()).await?;
        self.store.save_vehicle(vehicle.clone()).await?;

        log::info!(
            "📋 Vehículo {} ASIGNADO al pedido {}",
            vehicle.name,
            order.name
        );
        Ok(vehicle)
    }

    /// assigned → on_route
    pub async fn start_route(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        let lock = self.store.vehicle_lock(vehicle_id).await;
        let _guard = lock.lock().await;

        let mut vehicle = self.load_vehicle(vehicle_id).await?;
        if vehicle.operational_status != OperationalStatus::Assigned {
            return Err(AppError::Validation(
                "El vehículo debe estar asignado para salir a ruta".to_string(),
            ));
        }
        let mut order = self.active_order(vehicle_id).await?.ok_or_else(|| {
            AppError::Validation("El vehículo no tiene un pedido activo vinculado".to_string())
        })?;

        order.state = OrderState::OnRoute;
        vehicle.operational_status = OperationalStatus::OnRoute;

        self.store.save_order(order).await?;
        self.store.save_vehicle(vehicle.clone()).await?;

        log::info!("🚗 Vehículo {} EN RUTA de recogida", vehicle.name);
        Ok(vehicle)
    }

    /// on_route → picked
    pub async fn confirm_pickup(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        let lock = self.store.vehicle_lock(vehicle_id).await;
        let _guard = lock.lock().await;

        let mut vehicle = self.load_vehicle(vehicle_id).await?;
        if vehicle.operational_status != OperationalStatus::OnRoute {
            return Err(AppError::Validation(
                "El vehículo debe estar en ruta para recoger el paquete".to_string(),
            ));
        }
        vehicle.operational_status = OperationalStatus::Picked;
        self.store.save_vehicle(vehicle.clone()).await?;

        log::info!("📦 Paquete RECOGIDO por el vehículo {}", vehicle.name);
        Ok(vehicle)
    }

    /// picked → delivering
    pub async fn start_delivering(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        let lock = self.store.vehicle_lock(vehicle_id).await;
        let _guard = lock.lock().await;

        let mut vehicle = self.load_vehicle(vehicle_id).await?;
        if vehicle.operational_status != OperationalStatus::Picked {
            return Err(AppError::Validation(
                "El paquete debe estar recogido para iniciar la entrega".to_string(),
            ));
        }
        vehicle.operational_status = OperationalStatus::Delivering;
        self.store.save_vehicle(vehicle.clone()).await?;

        log::info!("🚚 Vehículo {} EN CAMINO de entrega", vehicle.name);
        Ok(vehicle)
    }

    /// delivering → delivered_ok | delivered_issue
    ///
    /// El pedido vinculado pasa a terminal `delivered` conservando el vínculo
    /// con el vehículo: los contadores de entregas se derivan de la relación.
    pub async fn confirm_delivered(&self, vehicle_id: Uuid, success: bool) -> AppResult<Vehicle> {
        let lock = self.store.vehicle_lock(vehicle_id).await;
        let _guard = lock.lock().await;

        let mut vehicle = self.load_vehicle(vehicle_id).await?;
        if vehicle.operational_status != OperationalStatus::Delivering {
            return Err(AppError::Validation(
                "El vehículo debe estar en camino de entrega para confirmarla".to_string(),
            ));
        }
        let mut order = self.active_order(vehicle_id).await?.ok_or_else(|| {
            AppError::Validation("El vehículo no tiene un pedido activo vinculado".to_string())
        })?;

        let new_status = if success {
            OperationalStatus::DeliveredOk
        } else {
            OperationalStatus::DeliveredIssue
        };
        vehicle.operational_status = new_status;
        order.state = OrderState::Delivered;

        let order_code = order.name.clone();
        self.store.save_order(order).await?;
        self.store.save_vehicle(vehicle.clone()).await?;

        if success {
            log::info!("✅ Entrega COMPLETADA exitosamente ({})", order_code);
        } else {
            log::info!("⚠️ Entrega COMPLETADA con incidencias ({})", order_code);
        }
        self.notify_customer(&vehicle, Some(order_code), new_status);
        Ok(vehicle)
    }

    /// cualquier estado activo → failed
    pub async fn fail_delivery(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        let lock = self.store.vehicle_lock(vehicle_id).await;
        let _guard = lock.lock().await;

        let mut vehicle = self.load_vehicle(vehicle_id).await?;
        if !vehicle.operational_status.is_active_delivery() {
            return Err(AppError::Validation(
                "Solo una entrega en curso puede marcarse como fallida".to_string(),
            ));
        }

        let mut order_code = None;
        if let Some(mut order) = self.active_order(vehicle_id).await? {
            // conserva el vínculo: los fallos por vehículo se derivan de aquí
            order.state = OrderState::Failed;
            order_code = Some(order.name.clone());
            self.store.save_order(order).await?;
        }

        vehicle.operational_status = OperationalStatus::Failed;
        self.store.save_vehicle(vehicle.clone()).await?;

        log::info!(
            "❌ Intento de entrega FALLIDO ({})",
            order_code.as_deref().unwrap_or("-")
        );
        self.notify_customer(&vehicle, order_code, OperationalStatus::Failed);
        Ok(vehicle)
    }

    /// cualquier estado activo → cancelled; libera el pedido del vehículo
    pub async fn cancel_delivery(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        let lock = self.store.vehicle_lock(vehicle_id).await;
        let _guard = lock.lock().await;

        let mut vehicle = self.load_vehicle(vehicle_id).await?;
        if !vehicle.operational_status.is_active_delivery() {
            return Err(AppError::Validation(
                "Solo una entrega en curso puede cancelarse".to_string(),
            ));
        }

        let mut order_code = None;
        if let Some(mut order) = self.active_order(vehicle_id).await? {
            order.state = OrderState::Cancelled;
            order.vehicle_id = None;
            order_code = Some(order.name.clone());
            self.store.save_order(order).await?;
        }

        vehicle.operational_status = OperationalStatus::Cancelled;
        self.store.save_vehicle(vehicle.clone()).await?;

        log::info!(
            "🚫 Entrega CANCELADA ({})",
            order_code.as_deref().unwrap_or("-")
        );
        self.notify_customer(&vehicle, order_code, OperationalStatus::Cancelled);
        Ok(vehicle)
    }

    /// estado terminal → available, solo si no queda pedido activo vinculado
    pub async fn set_available(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        let lock = self.store.vehicle_lock(vehicle_id).await;
        let _guard = lock.lock().await;

        let mut vehicle = self.load_vehicle(vehicle_id).await?;
        if !vehicle.operational_status.is_terminal() {
            return Err(AppError::Validation(
                "Solo un ciclo de entrega terminado puede volver a disponible".to_string(),
            ));
        }
        if self.active_order(vehicle_id).await?.is_some() {
            return Err(AppError::Validation(
                "No se puede marcar disponible: aún hay un pedido activo vinculado".to_string(),
            ));
        }

        vehicle.operational_status = OperationalStatus::Available;
        self.store.save_vehicle(vehicle.clone()).await?;

        log::info!("🟢 Vehículo {} marcado como DISPONIBLE", vehicle.name);
        Ok(vehicle)
    }

    /// Acción rápida que completa el ciclo entero desde `assigned`
    pub async fn complete_delivery_cycle(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        self.start_route(vehicle_id).await?;
        self.confirm_pickup(vehicle_id).await?;
        self.start_delivering(vehicle_id).await?;
        self.confirm_delivered(vehicle_id, true).await
    }

    // ==================== TRACKING GPS ====================

    /// Aplica una posición GPS al vehículo.
    ///
    /// Valida rangos de coordenadas antes de tocar nada; con posición previa
    /// acumula el delta haversine en ambos odómetros. Saltos mayores a 1 km
    /// generan un evento informativo de auditoría, nunca un fallo.
    pub async fn update_position(
        &self,
        vehicle_id: Uuid,
        position: &Position,
    ) -> AppResult<Vehicle> {
        validate_coordinates(position.latitude, position.longitude)?;

        let lock = self.store.vehicle_lock(vehicle_id).await;
        let _guard = lock.lock().await;

        let mut vehicle = self.load_vehicle(vehicle_id).await?;

        let mut delta = 0.0;
        if let Some((prev_lat, prev_lon)) = vehicle.last_position() {
            delta = geo::distance_km(prev_lat, prev_lon, position.latitude, position.longitude);
            if delta > JUMP_AUDIT_THRESHOLD_KM {
                log::info!(
                    "📍 Movimiento detectado: {:.2} km desde la última posición de {}",
                    delta,
                    vehicle.name
                );
                self.metrics.gps_jumps.inc();
            }
        }

        vehicle.last_latitude = Some(position.latitude);
        vehicle.last_longitude = Some(position.longitude);
        vehicle.last_speed = Some(position.speed.unwrap_or(0.0));
        vehicle.last_address = position.address.clone();
        vehicle.last_update = Some(position.fix_time.unwrap_or_else(Utc::now));
        vehicle.last_gps_ping = Some(Utc::now());
        vehicle.link_status = LinkStatus::Online;
        vehicle.total_km += delta;
        vehicle.distance_today += delta;

        self.store.save_vehicle(vehicle.clone()).await?;
        Ok(vehicle)
    }

    /// Actualiza el estado de conectividad del dispositivo del vehículo
    pub async fn set_link_status(&self, vehicle_id: Uuid, status: LinkStatus) -> AppResult<()> {
        let lock = self.store.vehicle_lock(vehicle_id).await;
        let _guard = lock.lock().await;

        let mut vehicle = self.load_vehicle(vehicle_id).await?;
        vehicle.link_status = status;
        self.store.save_vehicle(vehicle).await?;
        Ok(())
    }

    /// Pone a cero la distancia diaria de toda la flota (corte de medianoche)
    pub async fn reset_daily_distances(&self) -> AppResult<usize> {
        let vehicles = self.store.list_vehicles().await?;
        let total = vehicles.len();
        for vehicle in vehicles {
            let lock = self.store.vehicle_lock(vehicle.id).await;
            let _guard = lock.lock().await;
            let mut current = self.load_vehicle(vehicle.id).await?;
            current.distance_today = 0.0;
            self.store.save_vehicle(current).await?;
        }
        log::info!("🕛 Distancia diaria reiniciada para {} vehículos", total);
        Ok(total)
    }

    fn notify_customer(
        &self,
        vehicle: &Vehicle,
        order_code: Option<String>,
        event: OperationalStatus,
    ) {
        self.notifier.notify(CustomerNotification {
            vehicle_name: vehicle.name.clone(),
            order_code,
            event,
        });
        self.metrics.notifications_sent.inc();
    }
}
