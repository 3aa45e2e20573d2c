//! Métricas y monitoreo
//!
//! Contadores Prometheus del motor de despacho, expuestos en `/metrics`.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::utils::errors::{AppError, AppResult};

pub struct Metrics {
    registry: Registry,
    pub sweep_runs: IntCounter,
    pub sweep_skipped: IntCounter,
    pub sync_failures: IntCounter,
    pub webhook_events: IntCounter,
    /// Saltos de posición mayores a 1 km entre dos pings consecutivos
    pub gps_jumps: IntCounter,
    pub notifications_sent: IntCounter,
}

impl Metrics {
    pub fn new() -> AppResult<Self> {
        let registry = Registry::new();

        let sweep_runs = IntCounter::new(
            "rsexpress_sweep_runs_total",
            "Barridos de sincronización Traccar ejecutados",
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;
        let sweep_skipped = IntCounter::new(
            "rsexpress_sweep_skipped_total",
            "Barridos omitidos por solaparse con uno en curso",
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;
        let sync_failures = IntCounter::new(
            "rsexpress_sync_failures_total",
            "Vehículos cuya sincronización falló dentro de un barrido",
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;
        let webhook_events = IntCounter::new(
            "rsexpress_webhook_events_total",
            "Eventos de posición recibidos por webhook",
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;
        let gps_jumps = IntCounter::new(
            "rsexpress_gps_jumps_total",
            "Saltos de más de 1 km detectados entre posiciones consecutivas",
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;
        let notifications_sent = IntCounter::new(
            "rsexpress_notifications_total",
            "Notificaciones a cliente encoladas",
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        for counter in [
            &sweep_runs,
            &sweep_skipped,
            &sync_failures,
            &webhook_events,
            &gps_jumps,
            &notifications_sent,
        ] {
            registry
                .register(Box::new(counter.clone()))
                .map_err(|e| AppError::Internal(e.to_string()))?;
        }

        Ok(Self {
            registry,
            sweep_runs,
            sweep_skipped,
            sync_failures,
            webhook_events,
            gps_jumps,
            notifications_sent,
        })
    }

    /// Exposición en formato de texto Prometheus
    pub fn render(&self) -> AppResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| AppError::Internal(e.to_string()))
    }
}
