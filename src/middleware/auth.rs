//! Guardia de API key para los endpoints de OpsCenter
//!
//! Chequeo fijo del header `X-API-Key` contra la clave configurada. El
//! webhook de Traccar queda fuera de esta guardia por diseño (push
//! servidor-a-servidor).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;
use crate::utils::errors::AppError;

pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if key == state.config.opscenter_api_key => Ok(next.run(request).await),
        _ => Err(AppError::Authentication(
            "API key inválida o ausente".to_string(),
        )),
    }
}
