//! Sincronización periódica con Traccar
//!
//! Barrido sobre todos los vehículos con dispositivo GPS configurado. Las
//! llamadas al servidor se emiten con concurrencia acotada (pool de
//! workers) para que la latencia del barrido la marque el peor caso y no
//! la suma de todos; el fallo de un vehículo queda aislado y JAMÁS aborta
//! el lote. Dos barridos nunca se solapan: el segundo se omite.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::metrics::Metrics;
use crate::models::{LinkStatus, Vehicle};
use crate::repositories::FleetRepository;
use crate::services::dispatch_service::DispatchService;
use crate::services::traccar_client::TraccarClient;
use crate::utils::errors::{AppError, AppResult};

/// Resumen de un barrido de sincronización
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
    /// `true` si el barrido se omitió por solaparse con otro en curso
    pub skipped: bool,
}

#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn FleetRepository>,
    client: Arc<TraccarClient>,
    dispatch: DispatchService,
    sweep_lock: Arc<Mutex<()>>,
    metrics: Arc<Metrics>,
    concurrency: usize,
}

impl SyncService {
    pub fn new(
        store: Arc<dyn FleetRepository>,
        client: Arc<TraccarClient>,
        dispatch: DispatchService,
        sweep_lock: Arc<Mutex<()>>,
        metrics: Arc<Metrics>,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            client,
            dispatch,
            sweep_lock,
            metrics,
            concurrency: concurrency.max(1),
        }
    }

    /// Ejecuta un barrido completo de la flota
    pub async fn sweep(&self) -> AppResult<SweepSummary> {
        let _guard = match self.sweep_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::warn!("⏭️ Barrido omitido: ya hay una sincronización en curso");
                self.metrics.sweep_skipped.inc();
                return Ok(SweepSummary {
                    succeeded: 0,
                    failed: 0,
                    total: 0,
                    skipped: true,
                });
            }
        };

        self.metrics.sweep_runs.inc();

        let candidates: Vec<(Uuid, String, i64)> = self
            .store
            .list_vehicles()
            .await?
            .into_iter()
            .filter_map(|v| match v.traccar_device_id {
                Some(device_id) => Some((v.id, v.name, device_id)),
                None => None,
            })
            .collect();

        let total = candidates.len();

        let outcomes: Vec<bool> = stream::iter(candidates)
            .map(|(vehicle_id, name, device_id)| async move {
                self.sync_one(vehicle_id, &name, device_id).await
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let succeeded = outcomes.iter().filter(|ok| **ok).count();
        let failed = total - succeeded;

        log::info!(
            "Barrido Traccar completado: {} éxitos, {} fallos de {} vehículos",
            succeeded,
            failed,
            total
        );

        Ok(SweepSummary {
            succeeded,
            failed,
            total,
            skipped: false,
        })
    }

    /// Sincroniza un vehículo dentro del barrido. Devuelve `true` si la
    /// pasada fue exitosa; la ausencia de posición NO es un fallo, solo
    /// significa que el dispositivo aún no reporta.
    async fn sync_one(&self, vehicle_id: Uuid, name: &str, device_id: i64) -> bool {
        match self.client.get_last_position(device_id).await {
            Ok(Some(position)) => match self.dispatch.update_position(vehicle_id, &position).await
            {
                Ok(updated) => {
                    log::info!(
                        "Vehículo {} sincronizado: lat={:?}, lng={:?}, speed={:?}",
                        updated.name,
                        updated.last_latitude,
                        updated.last_longitude,
                        updated.last_speed
                    );
                    true
                }
                Err(e) => {
                    log::error!("Error aplicando posición a {}: {}", name, e);
                    self.mark_link(vehicle_id, name, LinkStatus::Unknown).await;
                    self.metrics.sync_failures.inc();
                    false
                }
            },
            Ok(None) => {
                log::warn!("No se pudo obtener posición del dispositivo {}", device_id);
                self.mark_link(vehicle_id, name, LinkStatus::Offline).await;
                true
            }
            Err(e) => {
                log::error!("Error en sync Traccar para {}: {}", name, e);
                self.mark_link(vehicle_id, name, LinkStatus::Unknown).await;
                self.metrics.sync_failures.inc();
                false
            }
        }
    }

    /// Sincronización oportunista de un solo vehículo (acción manual o
    /// endpoint de tracking). Propaga el fallo al llamador.
    pub async fn sync_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        let vehicle = self
            .store
            .get_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehículo '{}' no encontrado", vehicle_id)))?;

        let device_id = vehicle.traccar_device_id.ok_or_else(|| {
            AppError::Validation(format!(
                "El vehículo {} no tiene un dispositivo Traccar asociado. \
                 Configure el campo 'Traccar Device ID'.",
                vehicle.name
            ))
        })?;

        match self.client.get_last_position(device_id).await {
            Ok(Some(position)) => self.dispatch.update_position(vehicle_id, &position).await,
            Ok(None) => {
                self.dispatch
                    .set_link_status(vehicle_id, LinkStatus::Offline)
                    .await?;
                self.store
                    .get_vehicle(vehicle_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Vehículo desapareció del almacén".into()))
            }
            Err(e) => {
                self.mark_link(vehicle_id, &vehicle.name, LinkStatus::Unknown)
                    .await;
                Err(e)
            }
        }
    }

    async fn mark_link(&self, vehicle_id: Uuid, name: &str, status: LinkStatus) {
        if let Err(e) = self.dispatch.set_link_status(vehicle_id, status).await {
            log::error!("No se pudo actualizar el estado Traccar de {}: {}", name, e);
        }
    }
}
