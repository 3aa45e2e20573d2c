//! Valor de posición GPS
//!
//! Posición efímera: nunca se persiste por sí sola, se pliega sobre los
//! campos "última posición" del vehículo y se usa una vez para calcular el
//! delta de distancia. Todos los campos opcionales se modelan como `Option`
//! explícito: el motor nunca pregunta si un campo "existe", solo si trae
//! valor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub fix_time: Option<DateTime<Utc>>,
    pub address: Option<String>,
    /// Atributos reportados por el dispositivo (batería, odómetro, etc.)
    pub attributes: Option<serde_json::Value>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            speed: None,
            fix_time: None,
            address: None,
            attributes: None,
        }
    }
}
