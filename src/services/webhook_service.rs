//! Ingesta de posiciones por webhook
//!
//! Recibe eventos de posición empujados por Traccar Server. El contrato es
//! best-effort: el webhook SIEMPRE responde un acuse estructurado, nunca
//! propaga una excepción al servidor remoto. La escritura de posición pasa
//! por el mismo candado por-vehículo que el barrido de polling, así un
//! evento push y un poll simultáneos sobre el mismo vehículo nunca dejan
//! una mezcla parcial de campos.

use std::sync::Arc;

use crate::dto::webhook_dto::{TraccarWebhookPayload, WebhookAck};
use crate::metrics::Metrics;
use crate::models::Position;
use crate::repositories::FleetRepository;
use crate::services::dispatch_service::DispatchService;

#[derive(Clone)]
pub struct WebhookService {
    store: Arc<dyn FleetRepository>,
    dispatch: DispatchService,
    metrics: Arc<Metrics>,
}

impl WebhookService {
    pub fn new(
        store: Arc<dyn FleetRepository>,
        dispatch: DispatchService,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            dispatch,
            metrics,
        }
    }

    /// Aplica un evento de posición externo. El dispositivo se resuelve a
    /// vehículo por `deviceId`; un dispositivo desconocido produce un acuse
    /// de error, no un fallo.
    pub async fn ingest(&self, payload: TraccarWebhookPayload) -> WebhookAck {
        self.metrics.webhook_events.inc();

        let vehicle = match self.store.vehicle_by_device(payload.device_id).await {
            Ok(Some(vehicle)) => vehicle,
            Ok(None) => {
                log::warn!(
                    "⚠️ Webhook para Traccar Device ID {} sin vehículo asociado",
                    payload.device_id
                );
                return WebhookAck::error(format!(
                    "Vehículo con Traccar Device ID {} no encontrado",
                    payload.device_id
                ));
            }
            Err(e) => return WebhookAck::error(format!("Error consultando la flota: {}", e)),
        };

        let position = Position {
            latitude: payload.latitude,
            longitude: payload.longitude,
            speed: payload.speed,
            fix_time: payload.fix_time,
            address: payload.address,
            attributes: payload.attributes,
        };

        match self.dispatch.update_position(vehicle.id, &position).await {
            Ok(updated) => {
                log::info!(
                    "📡 Webhook aplicado a {}: lat={}, lng={}",
                    updated.name,
                    payload.latitude,
                    payload.longitude
                );
                WebhookAck::success(updated.id, updated.name)
            }
            Err(e) => WebhookAck::error(format!("No se pudo aplicar la posición: {}", e)),
        }
    }
}
