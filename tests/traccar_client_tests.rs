//! Tests del cliente Traccar contra un servidor local de prueba
//!
//! Cada escenario levanta un servidor axum efímero en 127.0.0.1:0 que
//! simula las respuestas de Traccar, incluyendo fallos de servidor.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use rsexpress_dispatch::config::TraccarConfig;
use rsexpress_dispatch::services::TraccarClient;
use rsexpress_dispatch::utils::errors::AppError;

async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config(base_url: String, max_retries: u32) -> TraccarConfig {
    TraccarConfig {
        base_url,
        username: "admin".to_string(),
        password: "admin".to_string(),
        timeout_secs: 2,
        max_retries,
    }
}

#[tokio::test]
async fn un_401_nunca_se_reintenta() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/devices",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::UNAUTHORIZED, "")
            }
        }),
    );
    let base = spawn_server(router).await;

    let client = TraccarClient::new(config(base, 3)).unwrap();
    let err = client.get_devices().await.unwrap_err();

    assert!(matches!(err, AppError::Authentication(_)));
    // exactamente UNA llamada HTTP: las credenciales no cambian a mitad
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn un_503_se_reintenta_hasta_agotar_y_escala() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/devices",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::SERVICE_UNAVAILABLE, "mantenimiento")
            }
        }),
    );
    let base = spawn_server(router).await;

    let max_retries = 2;
    let client = TraccarClient::new(config(base, max_retries)).unwrap();
    let err = client.get_devices().await.unwrap_err();

    match err {
        AppError::RemoteService { status, .. } => assert_eq!(status, 503),
        other => panic!("se esperaba RemoteService, llegó {:?}", other),
    }
    // intento original + max_retries reintentos
    assert_eq!(hits.load(Ordering::SeqCst), (max_retries + 1) as usize);
}

#[tokio::test]
async fn un_404_es_ausencia_no_error() {
    // servidor sin rutas: axum responde 404 a todo
    let base = spawn_server(Router::new()).await;
    let client = TraccarClient::new(config(base, 1)).unwrap();

    let devices = client.get_devices().await.unwrap();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn un_4xx_inesperado_es_fatal_sin_reintento() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/devices",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::UNPROCESSABLE_ENTITY, "parámetro inválido")
            }
        }),
    );
    let base = spawn_server(router).await;

    let client = TraccarClient::new(config(base, 3)).unwrap();
    let err = client.get_devices().await.unwrap_err();

    match err {
        AppError::RemoteService { status, body } => {
            assert_eq!(status, 422);
            assert_eq!(body, "parámetro inválido");
        }
        other => panic!("se esperaba RemoteService, llegó {:?}", other),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dispositivo_sin_position_id_devuelve_ausente() {
    let router = Router::new().route(
        "/devices",
        get(|| async {
            Json(json!([
                { "id": 7, "name": "Moto-007", "uniqueId": "IMEI007", "status": "offline" }
            ]))
        }),
    );
    let base = spawn_server(router).await;

    let client = TraccarClient::new(config(base, 1)).unwrap();
    let position = client.get_last_position(7).await.unwrap();
    assert!(position.is_none());
}

#[tokio::test]
async fn position_id_cero_tambien_es_ausente() {
    let router = Router::new().route(
        "/devices",
        get(|| async {
            Json(json!([
                { "id": 7, "name": "Moto-007", "uniqueId": "IMEI007", "positionId": 0 }
            ]))
        }),
    );
    let base = spawn_server(router).await;

    let client = TraccarClient::new(config(base, 1)).unwrap();
    let position = client.get_last_position(7).await.unwrap();
    assert!(position.is_none());
}

#[tokio::test]
async fn ultima_posicion_resuelve_el_puntero_del_dispositivo() {
    let router = Router::new()
        .route(
            "/devices",
            get(|| async {
                Json(json!([
                    { "id": 7, "name": "Moto-007", "uniqueId": "IMEI007",
                      "status": "online", "positionId": 99 }
                ]))
            }),
        )
        .route(
            "/positions",
            get(|| async {
                Json(json!([
                    { "id": 99, "deviceId": 7, "latitude": 4.60971, "longitude": -74.08175,
                      "speed": 12.5, "course": 180.0, "fixTime": "2026-08-06T10:30:00Z",
                      "address": "Cra 7 #10-20, Bogotá",
                      "attributes": { "batteryLevel": 85 } }
                ]))
            }),
        );
    let base = spawn_server(router).await;

    let client = TraccarClient::new(config(base, 1)).unwrap();
    let position = client.get_last_position(7).await.unwrap().unwrap();

    assert_eq!(position.latitude, 4.60971);
    assert_eq!(position.longitude, -74.08175);
    assert_eq!(position.speed, Some(12.5));
    assert!(position.fix_time.is_some());
    assert_eq!(position.address.as_deref(), Some("Cra 7 #10-20, Bogotá"));
}

#[tokio::test]
async fn dispositivo_inexistente_devuelve_ausente() {
    let router = Router::new().route(
        "/devices",
        get(|| async { Json(json!([{ "id": 1, "name": "Otra", "uniqueId": "X" }])) }),
    );
    let base = spawn_server(router).await;

    let client = TraccarClient::new(config(base, 1)).unwrap();
    assert!(client.get_last_position(999).await.unwrap().is_none());
    assert!(client.get_device(999).await.unwrap().is_none());
    assert!(client
        .get_device_by_unique_id("NO-EXISTE")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn busqueda_por_unique_id() {
    let router = Router::new().route(
        "/devices",
        get(|| async {
            Json(json!([
                { "id": 1, "name": "Moto-001", "uniqueId": "IMEI001" },
                { "id": 2, "name": "Moto-002", "uniqueId": "IMEI002" }
            ]))
        }),
    );
    let base = spawn_server(router).await;

    let client = TraccarClient::new(config(base, 1)).unwrap();
    let device = client.get_device_by_unique_id("IMEI002").await.unwrap().unwrap();
    assert_eq!(device.id, 2);
}

#[tokio::test]
async fn test_de_conexion_exitoso() {
    let router = Router::new()
        .route("/server", get(|| async { Json(json!({ "version": "5.12" })) }))
        .route(
            "/devices",
            get(|| async { Json(json!([{ "id": 1, "name": "Moto", "uniqueId": "X" }])) }),
        );
    let base = spawn_server(router).await;

    let client = TraccarClient::new(config(base.clone(), 1)).unwrap();
    let result = client.test_connection().await;

    assert!(result.success);
    assert_eq!(result.server_version.as_deref(), Some("5.12"));
    assert_eq!(result.devices_count, 1);
    assert_eq!(result.base_url, base);
}

#[tokio::test]
async fn test_de_conexion_captura_el_fallo() {
    // puerto sin listener: conexión rechazada
    let client =
        TraccarClient::new(config("http://127.0.0.1:9".to_string(), 0)).unwrap();
    let result = client.test_connection().await;

    assert!(!result.success);
    assert!(result.message.contains("Error conectando a Traccar"));
    assert_eq!(result.devices_count, 0);
    assert!(result.server_version.is_none());
}
