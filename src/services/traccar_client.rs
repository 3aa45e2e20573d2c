//! Cliente HTTP para la API de Traccar Server
//!
//! Cliente reutilizable para obtener datos de tracking GPS en tiempo real:
//! autenticación HTTP Basic, timeouts configurables, retry automático con
//! backoff exponencial y fallos tipados.
//!
//! Endpoints consumidos:
//! - `GET /server`    — información del servidor (test de conexión)
//! - `GET /devices`   — dispositivos GPS registrados
//! - `GET /positions` — posiciones por id puntual o por rango histórico

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::TraccarConfig;
use crate::models::Position;
use crate::utils::errors::{AppError, AppResult};

/// Base del backoff exponencial entre reintentos (deviación documentada:
/// la política de origen no fija demora alguna)
const BACKOFF_BASE_MS: u64 = 250;
/// Techo del backoff
const BACKOFF_CAP_MS: u64 = 5_000;

/// Dispositivo GPS tal como lo representa Traccar
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i64,
    pub name: Option<String>,
    pub unique_id: Option<String>,
    pub status: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    /// Puntero a la última posición registrada; 0 o ausente significa que
    /// el dispositivo aún no reportó ninguna
    pub position_id: Option<i64>,
}

/// Posición en el formato de wire de Traccar
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraccarPosition {
    pub id: Option<i64>,
    pub device_id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub course: Option<f64>,
    pub fix_time: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub attributes: Option<serde_json::Value>,
}

impl From<TraccarPosition> for Position {
    fn from(p: TraccarPosition) -> Self {
        Position {
            latitude: p.latitude,
            longitude: p.longitude,
            speed: p.speed,
            fix_time: p.fix_time,
            address: p.address,
            attributes: p.attributes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServerInfo {
    version: Option<String>,
}

/// Resultado del test de conexión: captura el fallo, nunca lo propaga
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
    pub server_version: Option<String>,
    pub devices_count: usize,
    pub base_url: String,
}

/// Cliente HTTP para Traccar Server API
pub struct TraccarClient {
    config: TraccarConfig,
    client: reqwest::Client,
    auth_header: String,
}

impl TraccarClient {
    /// Construye el cliente validando la configuración completa.
    /// Configuración incompleta es un error inmediato, no un fallo diferido
    /// a la primera llamada.
    pub fn new(config: TraccarConfig) -> AppResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AppError::Configuration(format!("No se pudo construir el cliente HTTP: {}", e))
            })?;

        let auth_header = format!(
            "Basic {}",
            BASE64.encode(format!("{}:{}", config.username, config.password))
        );

        log::info!("TraccarClient inicializado: {}", config.base_url);

        Ok(Self {
            config,
            client,
            auth_header,
        })
    }

    /// Petición GET con retry automático.
    ///
    /// - 2xx → cuerpo JSON
    /// - 401 → error de autenticación, SIN reintento (las credenciales no
    ///   van a cambiar a mitad de la secuencia)
    /// - 404 → `None` (ausencia, no error)
    /// - 5xx / timeout / conexión rechazada → reintento hasta `max_retries`,
    ///   luego escalado a error de servicio remoto
    /// - resto de códigos → error de servicio remoto inmediato
    async fn request_json(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> AppResult<Option<serde_json::Value>> {
        let url = format!("{}{}", self.config.base_url, endpoint);
        let mut attempt: u32 = 0;
        let mut last_status: u16 = 0;

        loop {
            log::debug!("Traccar GET {} | params={:?}", url, query);

            let result = self
                .client
                .get(&url)
                .header(header::AUTHORIZATION, &self.auth_header)
                .header(header::ACCEPT, "application/json")
                .query(query)
                .send()
                .await;

            let failure = match result {
                Ok(response) => {
                    let status = response.status();
                    log::debug!("Traccar response: {}", status);

                    if status.is_success() {
                        let body = response.json::<serde_json::Value>().await.map_err(|e| {
                            AppError::RemoteService {
                                status: status.as_u16(),
                                body: format!("Respuesta JSON inválida de Traccar: {}", e),
                            }
                        })?;
                        return Ok(Some(body));
                    } else if status == StatusCode::UNAUTHORIZED {
                        return Err(AppError::Authentication(
                            "Autenticación con Traccar fallida. Verifique \
                             TRACCAR_API_USERNAME y TRACCAR_API_PASSWORD"
                                .to_string(),
                        ));
                    } else if status == StatusCode::NOT_FOUND {
                        log::warn!("⚠️ Traccar endpoint no encontrado: {}", url);
                        return Ok(None);
                    } else if status.is_server_error() {
                        last_status = status.as_u16();
                        let body = response.text().await.unwrap_or_default();
                        AppError::TransientNetwork(format!(
                            "Traccar error {}: {}",
                            last_status, body
                        ))
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        return Err(AppError::RemoteService {
                            status: status.as_u16(),
                            body,
                        });
                    }
                }
                Err(e) if e.is_timeout() => AppError::TransientNetwork(format!(
                    "Timeout conectando a Traccar ({}s)",
                    self.config.timeout_secs
                )),
                Err(e) if e.is_connect() => AppError::TransientNetwork(format!(
                    "No se puede conectar a Traccar: {}",
                    self.config.base_url
                )),
                Err(e) => {
                    return Err(AppError::Internal(format!(
                        "Error inesperado conectando a Traccar: {}",
                        e
                    )))
                }
            };

            if attempt < self.config.max_retries {
                attempt += 1;
                let delay = backoff_delay(attempt);
                log::info!(
                    "🔁 Retry {}/{} en {:?} | {}",
                    attempt,
                    self.config.max_retries,
                    delay,
                    failure
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            // Reintentos agotados: el fallo transitorio escala a definitivo
            return Err(match failure {
                AppError::TransientNetwork(msg) => AppError::RemoteService {
                    status: last_status,
                    body: msg,
                },
                other => other,
            });
        }
    }

    /// Obtiene todos los dispositivos GPS de Traccar
    pub async fn get_devices(&self) -> AppResult<Vec<Device>> {
        match self.request_json("/devices", &[]).await? {
            Some(body) => serde_json::from_value(body).map_err(|e| {
                AppError::Internal(format!("Lista de dispositivos no parseable: {}", e))
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Obtiene un dispositivo específico por ID
    pub async fn get_device(&self, device_id: i64) -> AppResult<Option<Device>> {
        let devices = self.get_devices().await?;
        let device = devices.into_iter().find(|d| d.id == device_id);
        if device.is_none() {
            log::warn!("Dispositivo {} no encontrado en Traccar", device_id);
        }
        Ok(device)
    }

    /// Busca dispositivo por uniqueId (IMEI, serial, etc.)
    pub async fn get_device_by_unique_id(&self, unique_id: &str) -> AppResult<Option<Device>> {
        let devices = self.get_devices().await?;
        let device = devices
            .into_iter()
            .find(|d| d.unique_id.as_deref() == Some(unique_id));
        if device.is_none() {
            log::warn!("Dispositivo con uniqueId '{}' no encontrado", unique_id);
        }
        Ok(device)
    }

    /// Última posición conocida de un dispositivo.
    ///
    /// Traccar no expone un endpoint directo: primero se resuelve el puntero
    /// `positionId` del dispositivo y luego se consulta esa posición puntual.
    /// Un dispositivo sin posiciones registradas devuelve `None`, no error.
    pub async fn get_last_position(&self, device_id: i64) -> AppResult<Option<Position>> {
        let device = match self.get_device(device_id).await? {
            Some(device) => device,
            None => return Ok(None),
        };

        let position_id = match device.position_id {
            Some(id) if id > 0 => id,
            _ => {
                log::warn!("Dispositivo {} sin posiciones registradas", device_id);
                return Ok(None);
            }
        };

        let query = vec![("id".to_string(), position_id.to_string())];
        let positions: Vec<TraccarPosition> = match self.request_json("/positions", &query).await? {
            Some(body) => serde_json::from_value(body)
                .map_err(|e| AppError::Internal(format!("Posición no parseable: {}", e)))?,
            None => return Ok(None),
        };

        Ok(positions.into_iter().next().map(Position::from))
    }

    /// Posiciones históricas de uno o más dispositivos.
    /// Sin rango explícito se consultan las últimas 24 horas.
    pub async fn get_positions(
        &self,
        device_ids: &[i64],
        from_time: Option<DateTime<Utc>>,
        to_time: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Position>> {
        let to_time = to_time.unwrap_or_else(Utc::now);
        let from_time = from_time.unwrap_or_else(|| to_time - ChronoDuration::hours(24));

        let mut query: Vec<(String, String)> = device_ids
            .iter()
            .map(|id| ("deviceId".to_string(), id.to_string()))
            .collect();
        query.push(("from".to_string(), format_traccar_time(from_time)));
        query.push(("to".to_string(), format_traccar_time(to_time)));

        let positions: Vec<TraccarPosition> = match self.request_json("/positions", &query).await? {
            Some(body) => serde_json::from_value(body)
                .map_err(|e| AppError::Internal(format!("Posiciones no parseables: {}", e)))?,
            None => Vec::new(),
        };

        Ok(positions.into_iter().map(Position::from).collect())
    }

    /// Prueba la conexión con Traccar. Nunca lanza: los fallos se capturan
    /// dentro del resultado.
    pub async fn test_connection(&self) -> ConnectionTestResult {
        let server = self.request_json("/server", &[]).await;
        let devices = self.get_devices().await;

        match (server, devices) {
            (Ok(server_body), Ok(devices)) => {
                let version = server_body
                    .and_then(|body| serde_json::from_value::<ServerInfo>(body).ok())
                    .and_then(|info| info.version);
                ConnectionTestResult {
                    success: true,
                    message: "Conexión exitosa con Traccar".to_string(),
                    server_version: version,
                    devices_count: devices.len(),
                    base_url: self.config.base_url.clone(),
                }
            }
            (Err(e), _) | (_, Err(e)) => ConnectionTestResult {
                success: false,
                message: format!("Error conectando a Traccar: {}", e),
                server_version: None,
                devices_count: 0,
                base_url: self.config.base_url.clone(),
            },
        }
    }
}

/// Backoff exponencial con jitter: 250ms, 500ms, 1s... con techo de 5s
fn backoff_delay(attempt: u32) -> Duration {
    let exp = BACKOFF_BASE_MS.saturating_mul(1u64 << (attempt - 1).min(10));
    let jitter = rand::thread_rng().gen_range(0..100);
    Duration::from_millis(exp.min(BACKOFF_CAP_MS) + jitter)
}

/// Formato de timestamp que espera Traccar: ISO-8601 con milisegundos UTC
fn format_traccar_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TraccarConfig {
        TraccarConfig {
            base_url: "http://localhost:8082/api".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            timeout_secs: 10,
            max_retries: 3,
        }
    }

    #[test]
    fn construccion_falla_con_config_incompleta() {
        let mut incomplete = config();
        incomplete.username = String::new();
        let err = TraccarClient::new(incomplete).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn construccion_falla_con_timeout_cero() {
        let mut bad = config();
        bad.timeout_secs = 0;
        assert!(TraccarClient::new(bad).is_err());
    }

    #[test]
    fn formato_de_tiempo_traccar() {
        let t = DateTime::parse_from_rfc3339("2025-11-30T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_traccar_time(t), "2025-11-30T10:30:00.000Z");
    }

    #[test]
    fn backoff_crece_y_respeta_el_techo() {
        let d1 = backoff_delay(1).as_millis() as u64;
        let d3 = backoff_delay(3).as_millis() as u64;
        let d10 = backoff_delay(10).as_millis() as u64;
        assert!((250..350).contains(&d1));
        assert!((1000..1100).contains(&d3));
        assert!(d10 <= BACKOFF_CAP_MS + 100);
    }
}
