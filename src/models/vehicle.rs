//! Modelo de Vehicle
//!
//! Vehículo/mensajero de la flota RSExpress con su estado operativo,
//! última posición GPS conocida y vínculo con el dispositivo Traccar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Estado operativo del vehículo durante el ciclo de entrega
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationalStatus {
    Available,
    Assigned,
    OnRoute,
    Picked,
    Delivering,
    DeliveredOk,
    DeliveredIssue,
    Failed,
    Cancelled,
}

impl OperationalStatus {
    /// Etiqueta legible para el dashboard
    pub fn label(&self) -> &'static str {
        match self {
            OperationalStatus::Available => "Disponible",
            OperationalStatus::Assigned => "Asignado",
            OperationalStatus::OnRoute => "En ruta de recogida",
            OperationalStatus::Picked => "Paquete recogido",
            OperationalStatus::Delivering => "En camino de entrega",
            OperationalStatus::DeliveredOk => "Entregado exitosamente",
            OperationalStatus::DeliveredIssue => "Entregado con incidencias",
            OperationalStatus::Failed => "Intento fallido",
            OperationalStatus::Cancelled => "Cancelado",
        }
    }

    /// Estados en los que el vehículo está ejecutando una entrega
    pub fn is_active_delivery(&self) -> bool {
        matches!(
            self,
            OperationalStatus::Assigned
                | OperationalStatus::OnRoute
                | OperationalStatus::Picked
                | OperationalStatus::Delivering
        )
    }

    /// Estados terminales de un ciclo de entrega
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationalStatus::DeliveredOk
                | OperationalStatus::DeliveredIssue
                | OperationalStatus::Failed
                | OperationalStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationalStatus::Available => "available",
            OperationalStatus::Assigned => "assigned",
            OperationalStatus::OnRoute => "on_route",
            OperationalStatus::Picked => "picked",
            OperationalStatus::Delivering => "delivering",
            OperationalStatus::DeliveredOk => "delivered_ok",
            OperationalStatus::DeliveredIssue => "delivered_issue",
            OperationalStatus::Failed => "failed",
            OperationalStatus::Cancelled => "cancelled",
        }
    }
}

/// Estado de conectividad inferido del dispositivo GPS
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Unknown,
    Online,
    Offline,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Unknown => "unknown",
            LinkStatus::Online => "online",
            LinkStatus::Offline => "offline",
        }
    }
}

/// Vehículo de la flota
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    /// Código interno único del vehículo/mensajero
    pub internal_code: String,
    pub name: String,
    pub driver_name: Option<String>,

    /// ID del dispositivo GPS en Traccar Server
    pub traccar_device_id: Option<i64>,
    /// IMEI o identificador único del dispositivo GPS
    pub traccar_unique_id: Option<String>,

    pub operational_status: OperationalStatus,
    pub link_status: LinkStatus,

    pub last_latitude: Option<f64>,
    pub last_longitude: Option<f64>,
    pub last_speed: Option<f64>,
    pub last_address: Option<String>,
    /// Timestamp de la última posición GPS reportada por el dispositivo
    pub last_update: Option<DateTime<Utc>>,
    /// Momento en que el sistema registró la última posición
    pub last_gps_ping: Option<DateTime<Utc>>,

    /// Kilómetros acumulados desde el alta del vehículo
    pub total_km: f64,
    /// Kilómetros acumulados en el día en curso
    pub distance_today: f64,

    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(internal_code: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            internal_code,
            name,
            driver_name: None,
            traccar_device_id: None,
            traccar_unique_id: None,
            operational_status: OperationalStatus::Available,
            link_status: LinkStatus::Unknown,
            last_latitude: None,
            last_longitude: None,
            last_speed: None,
            last_address: None,
            last_update: None,
            last_gps_ping: None,
            total_km: 0.0,
            distance_today: 0.0,
            created_at: Utc::now(),
        }
    }

    /// Última posición conocida, si el vehículo ya reportó alguna
    pub fn last_position(&self) -> Option<(f64, f64)> {
        match (self.last_latitude, self.last_longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}
