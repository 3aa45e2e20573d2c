//! Controlador del OpsCenter
//!
//! Dashboard operativo estilo Uber Dispatch: KPIs en tiempo real, tracking
//! puntual por vehículo y prueba de conexión con Traccar.

use chrono::{NaiveTime, Utc};
use uuid::Uuid;

use crate::dto::opscenter_dto::{
    FleetMapResponse, FleetMapRow, OpsDataResponse, VehicleTrackingResponse,
};
use crate::services::opscenter_service::build_snapshot;
use crate::services::sync_service::SweepSummary;
use crate::services::traccar_client::ConnectionTestResult;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

pub struct OpsCenterController {
    state: AppState,
}

impl OpsCenterController {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Datos en tiempo real para el dashboard
    pub async fn ops_data(&self) -> AppResult<OpsDataResponse> {
        let vehicles = self.state.store.list_vehicles().await?;
        let orders = self.state.store.list_orders().await?;

        // Corte de "hoy": medianoche UTC (el huso es asunto del despliegue)
        let day_start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();

        Ok(OpsDataResponse {
            snapshot: build_snapshot(&vehicles, &orders, day_start),
            last_update: Utc::now(),
        })
    }

    /// Campos GPS de un vehículo, con sincronización oportunista previa.
    /// El fallo del sync se registra pero no impide responder con lo último
    /// conocido.
    pub async fn vehicle_tracking(&self, vehicle_id: Uuid) -> AppResult<VehicleTrackingResponse> {
        let vehicle = self
            .state
            .store
            .get_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehículo no encontrado".to_string()))?;

        if vehicle.traccar_device_id.is_some() {
            if let Err(e) = self.state.sync().sync_vehicle(vehicle_id).await {
                log::warn!("⚠️ Sync oportunista falló para {}: {}", vehicle.name, e);
            }
        }

        let vehicle = self
            .state
            .store
            .get_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehículo no encontrado".to_string()))?;

        Ok(VehicleTrackingResponse {
            vehicle_id: vehicle.id,
            vehicle_name: vehicle.name.clone(),
            latitude: vehicle.last_latitude.unwrap_or(0.0),
            longitude: vehicle.last_longitude.unwrap_or(0.0),
            speed: vehicle.last_speed.unwrap_or(0.0),
            last_update: vehicle.last_update,
            address: vehicle
                .last_address
                .clone()
                .unwrap_or_else(|| "Sin dirección".to_string()),
            status: vehicle.operational_status.as_str().to_string(),
            traccar_status: vehicle.link_status.as_str().to_string(),
            distance_today: vehicle.distance_today,
        })
    }

    /// Posiciones de todos los vehículos que ya reportaron alguna
    pub async fn fleet_map(&self) -> AppResult<FleetMapResponse> {
        let rows: Vec<FleetMapRow> = self
            .state
            .store
            .list_vehicles()
            .await?
            .into_iter()
            .filter_map(|v| {
                v.last_position().map(|(lat, lng)| FleetMapRow {
                    id: v.id,
                    name: v.name.clone(),
                    lat,
                    lng,
                    speed: v.last_speed.unwrap_or(0.0),
                    status: v.operational_status.as_str().to_string(),
                    driver: v
                        .driver_name
                        .clone()
                        .unwrap_or_else(|| "Sin conductor".to_string()),
                    last_update: v.last_update,
                })
            })
            .collect();

        Ok(FleetMapResponse {
            count: rows.len(),
            vehicles: rows,
            timestamp: Utc::now(),
        })
    }

    /// Prueba de conexión con Traccar: captura el fallo en el resultado
    pub async fn traccar_test(&self) -> ConnectionTestResult {
        self.state.traccar.test_connection().await
    }

    /// Disparo manual de un barrido de sincronización
    pub async fn trigger_sweep(&self) -> AppResult<SweepSummary> {
        self.state.sync().sweep().await
    }
}
