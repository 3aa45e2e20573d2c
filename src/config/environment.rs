//! Configuración de variables de entorno
//!
//! Toda la configuración se lee UNA sola vez al arranque y se empaqueta en
//! structs inmutables; ningún servicio consulta el entorno a mitad de una
//! llamada. La ausencia de una clave requerida es un error de configuración
//! en la construcción, nunca en tiempo de request.

use std::env;

use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::require_non_empty;

/// Configuración del cliente Traccar.
///
/// Claves requeridas:
/// - TRACCAR_API_URL      (ej: http://traccar-server:8082/api)
/// - TRACCAR_API_USERNAME
/// - TRACCAR_API_PASSWORD
/// - TRACCAR_API_TIMEOUT  (segundos)
/// - TRACCAR_API_RETRY    (número máximo de reintentos)
#[derive(Debug, Clone)]
pub struct TraccarConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl TraccarConfig {
    pub fn from_env() -> AppResult<Self> {
        let config = Self {
            base_url: required_var("TRACCAR_API_URL")?,
            username: required_var("TRACCAR_API_USERNAME")?,
            password: required_var("TRACCAR_API_PASSWORD")?,
            timeout_secs: parse_var("TRACCAR_API_TIMEOUT")?,
            max_retries: parse_var("TRACCAR_API_RETRY")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Valida la configuración completa; falla rápido con un error de
    /// configuración si algún campo está vacío o fuera de rango.
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty(&self.base_url, "TRACCAR_API_URL")?;
        require_non_empty(&self.username, "TRACCAR_API_USERNAME")?;
        require_non_empty(&self.password, "TRACCAR_API_PASSWORD")?;
        if self.timeout_secs == 0 {
            return Err(AppError::Configuration(
                "TRACCAR_API_TIMEOUT debe ser mayor que cero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub port: u16,
    pub host: String,
    /// API key de OpsCenter: requerida por los endpoints de dashboard
    pub opscenter_api_key: String,
    /// Intervalo del barrido de sincronización en segundos
    pub sync_interval_secs: u64,
    /// Concurrencia máxima de llamadas a Traccar durante un barrido
    pub sync_concurrency: usize,
    pub cors_origins: Vec<String>,
    pub traccar: TraccarConfig,
}

impl EnvironmentConfig {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| {
                    AppError::Configuration("PORT debe ser un número válido".to_string())
                })?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            opscenter_api_key: required_var("OPSCENTER_API_KEY")?,
            sync_interval_secs: env::var("SYNC_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| {
                    AppError::Configuration(
                        "SYNC_INTERVAL_SECS debe ser un número válido".to_string(),
                    )
                })?,
            sync_concurrency: env::var("SYNC_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .map_err(|_| {
                    AppError::Configuration("SYNC_CONCURRENCY debe ser un número válido".to_string())
                })?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
            traccar: TraccarConfig::from_env()?,
        })
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required_var(key: &str) -> AppResult<String> {
    let value = env::var(key)
        .map_err(|_| AppError::Configuration(format!("{} must be set", key)))?;
    require_non_empty(&value, key)?;
    Ok(value)
}

fn parse_var<T: std::str::FromStr>(key: &str) -> AppResult<T> {
    required_var(key)?.parse().map_err(|_| {
        AppError::Configuration(format!("{} debe ser un número válido", key))
    })
}
