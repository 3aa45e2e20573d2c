//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    /// Fallo definitivo del servicio remoto. `status == 0` indica que nunca
    /// hubo respuesta HTTP (timeout o conexión rechazada tras los reintentos).
    #[error("Remote service error {status}: {body}")]
    RemoteService { status: u16, body: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Configuration(msg) => {
                log::error!("❌ Configuración inválida: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Configuration Error".to_string(),
                        message: msg,
                        details: None,
                        code: Some("CONFIGURATION_ERROR".to_string()),
                    },
                )
            }

            AppError::Authentication(msg) => {
                log::error!("❌ Error de autenticación: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "Authentication Error".to_string(),
                        message: msg,
                        details: None,
                        code: Some("AUTHENTICATION_ERROR".to_string()),
                    },
                )
            }

            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    code: Some("NOT_FOUND".to_string()),
                },
            ),

            AppError::TransientNetwork(msg) => {
                log::warn!("⚠️ Error transitorio de red: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse {
                        error: "Transient Network Error".to_string(),
                        message: msg,
                        details: None,
                        code: Some("TRANSIENT_NETWORK_ERROR".to_string()),
                    },
                )
            }

            AppError::RemoteService { status, body } => {
                log::error!("❌ Error del servicio remoto {}: {}", status, body);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse {
                        error: "Remote Service Error".to_string(),
                        message: "An error occurred while communicating with the tracking server"
                            .to_string(),
                        details: Some(json!({ "remote_status": status, "remote_body": body })),
                        code: Some("REMOTE_SERVICE_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: msg,
                    details: None,
                    code: Some("VALIDATION_ERROR".to_string()),
                },
            ),

            AppError::Integrity(msg) => {
                log::warn!("⚠️ Integridad de datos comprometida: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "Integrity Error".to_string(),
                        message: msg,
                        details: None,
                        code: Some("INTEGRITY_ERROR".to_string()),
                    },
                )
            }

            AppError::Internal(msg) => {
                log::error!("❌ Error interno: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de validación
pub fn validation_error(message: &str) -> AppError {
    AppError::Validation(message.to_string())
}
