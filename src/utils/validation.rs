//! Utilidades de validación
//!
//! Funciones helper para validar coordenadas y campos de entrada.

use crate::utils::errors::{AppError, AppResult};

/// Valida que un par de coordenadas esté dentro de los rangos geográficos
/// válidos: lat ∈ [-90, 90], lon ∈ [-180, 180].
pub fn validate_coordinates(latitude: f64, longitude: f64) -> AppResult<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::Validation(format!(
            "Latitud fuera de rango: {} (esperado [-90, 90])",
            latitude
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::Validation(format!(
            "Longitud fuera de rango: {} (esperado [-180, 180])",
            longitude
        )));
    }
    Ok(())
}

/// Valida que un string de configuración no esté vacío
pub fn require_non_empty(value: &str, key: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Configuration(format!(
            "El parámetro '{}' es requerido y no puede estar vacío",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordenadas_validas_pasan() {
        assert!(validate_coordinates(4.60971, -74.08175).is_ok());
        assert!(validate_coordinates(-90.0, 180.0).is_ok());
        assert!(validate_coordinates(90.0, -180.0).is_ok());
    }

    #[test]
    fn coordenadas_fuera_de_rango_fallan() {
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, 180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn config_vacia_falla() {
        assert!(require_non_empty("", "traccar.api.url").is_err());
        assert!(require_non_empty("   ", "traccar.api.username").is_err());
        assert!(require_non_empty("admin", "traccar.api.username").is_ok());
    }
}
