//! Payloads del webhook de Traccar
//!
//! Configuración en Traccar Server:
//! ```xml
//! <entry key='notificator.types'>web</entry>
//! <entry key='notificator.web.url'>https://tu-backend/rsexpress/traccar/webhook</entry>
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Evento de posición empujado por Traccar
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraccarWebhookPayload {
    pub device_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub fix_time: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub attributes: Option<serde_json::Value>,
}

/// Acuse estructurado del webhook: el contrato con Traccar es best-effort
/// y la respuesta existe SIEMPRE, incluso ante datos inválidos
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_name: Option<String>,
}

impl WebhookAck {
    pub fn success(vehicle_id: Uuid, vehicle_name: String) -> Self {
        Self {
            status: "success".to_string(),
            message: "Posición actualizada".to_string(),
            vehicle_id: Some(vehicle_id),
            vehicle_name: Some(vehicle_name),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message,
            vehicle_id: None,
            vehicle_name: None,
        }
    }
}
