//! Tests de la superficie HTTP completa vía `tower::ServiceExt::oneshot`

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use rsexpress_dispatch::config::{EnvironmentConfig, TraccarConfig};
use rsexpress_dispatch::models::Vehicle;
use rsexpress_dispatch::repositories::{FleetRepository, MemoryFleetRepository};
use rsexpress_dispatch::routes::create_app;
use rsexpress_dispatch::state::AppState;

const API_KEY: &str = "test-api-key";

fn test_config() -> EnvironmentConfig {
    EnvironmentConfig {
        port: 0,
        host: "127.0.0.1".to_string(),
        opscenter_api_key: API_KEY.to_string(),
        sync_interval_secs: 3600,
        sync_concurrency: 2,
        cors_origins: Vec::new(),
        traccar: TraccarConfig {
            // puerto sin listener: los endpoints que no tocan Traccar no
            // deben depender de que el servidor remoto exista
            base_url: "http://127.0.0.1:9".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            timeout_secs: 1,
            max_retries: 0,
        },
    }
}

async fn test_app() -> (Arc<MemoryFleetRepository>, Router) {
    let store = Arc::new(MemoryFleetRepository::new());
    let state = AppState::with_store(test_config(), store.clone()).unwrap();
    (store, create_app(state))
}

async fn request(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
    api_key: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

#[tokio::test]
async fn endpoint_de_prueba_responde() {
    let (_store, app) = test_app().await;
    let (status, body) = request(&app, "GET", "/test", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn webhook_con_dispositivo_desconocido_no_muta_nada() {
    let (store, app) = test_app().await;
    let mut vehicle = Vehicle::new("V-001".to_string(), "Moto-001".to_string());
    vehicle.traccar_device_id = Some(42);
    let vehicle = store.create_vehicle(vehicle).await.unwrap();

    let payload = json!({
        "deviceId": 999,
        "latitude": 4.60971,
        "longitude": -74.08175
    });
    let (status, body) =
        request(&app, "POST", "/rsexpress/traccar/webhook", Some(payload), None).await;

    // el contrato del webhook es best-effort: acuse estructurado, nunca 500
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");

    let current = store.get_vehicle(vehicle.id).await.unwrap().unwrap();
    assert!(current.last_latitude.is_none());
}

#[tokio::test]
async fn webhook_aplica_la_posicion_al_vehiculo_del_dispositivo() {
    let (store, app) = test_app().await;
    let mut vehicle = Vehicle::new("V-001".to_string(), "Moto-001".to_string());
    vehicle.traccar_device_id = Some(42);
    let vehicle = store.create_vehicle(vehicle).await.unwrap();

    let payload = json!({
        "deviceId": 42,
        "latitude": 4.60971,
        "longitude": -74.08175,
        "speed": 33.0,
        "fixTime": "2026-08-06T10:30:00Z",
        "attributes": { "batteryLevel": 91 }
    });
    let (status, body) =
        request(&app, "POST", "/rsexpress/traccar/webhook", Some(payload), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["vehicleId"], vehicle.id.to_string());

    let current = store.get_vehicle(vehicle.id).await.unwrap().unwrap();
    assert_eq!(current.last_latitude, Some(4.60971));
    assert_eq!(current.last_speed, Some(33.0));
}

#[tokio::test]
async fn webhook_con_payload_invalido_tambien_responde_acuse() {
    let (_store, app) = test_app().await;

    // sin latitude: ni siquiera parsea al payload esperado
    let payload = json!({ "deviceId": 42 });
    let (status, body) =
        request(&app, "POST", "/rsexpress/traccar/webhook", Some(payload), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn webhook_con_coordenadas_invalidas_responde_acuse_de_error() {
    let (store, app) = test_app().await;
    let mut vehicle = Vehicle::new("V-001".to_string(), "Moto-001".to_string());
    vehicle.traccar_device_id = Some(42);
    let vehicle = store.create_vehicle(vehicle).await.unwrap();

    let payload = json!({ "deviceId": 42, "latitude": 95.0, "longitude": 0.0 });
    let (status, body) =
        request(&app, "POST", "/rsexpress/traccar/webhook", Some(payload), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");

    let current = store.get_vehicle(vehicle.id).await.unwrap().unwrap();
    assert!(current.last_latitude.is_none());
}

#[tokio::test]
async fn el_dashboard_exige_api_key() {
    let (_store, app) = test_app().await;

    let (status, _) = request(&app, "GET", "/rsexpress/opscenter/data", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        request(&app, "GET", "/rsexpress/opscenter/data", None, Some("clave-mala")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        request(&app, "GET", "/rsexpress/opscenter/data", None, Some(API_KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("kpi_total_orders").is_some());
    assert!(body.get("last_update").is_some());
}

#[tokio::test]
async fn flujo_de_despacho_completo_por_http() {
    let (_store, app) = test_app().await;

    // alta de vehículo con conductor
    let (status, body) = request(
        &app,
        "POST",
        "/api/vehicle",
        Some(json!({
            "internal_code": "V-001",
            "name": "Moto-001",
            "driver_name": "Juan Pérez"
        })),
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let vehicle_id = body["data"]["id"].as_str().unwrap().to_string();

    // alta de pedido
    let (status, body) = request(
        &app,
        "POST",
        "/api/order",
        Some(json!({
            "pickup_address": "Cra 7 #10-20, Bogotá",
            "delivery_address": "Cll 85 #12-33, Bogotá",
            "customer_name": "Cliente Prueba",
            "customer_phone": "3001234567",
            "task_description": "Caja mediana"
        })),
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let order_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["name"], "RSX-00001");

    // ciclo: asignar → ruta → recoger → entregar
    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/vehicle/{}/assign", vehicle_id),
        Some(json!({ "order_id": order_id })),
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for action in ["start-route", "pickup", "delivering"] {
        let (status, _) = request(
            &app,
            "POST",
            &format!("/api/vehicle/{}/{}", vehicle_id, action),
            None,
            Some(API_KEY),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "acción {} falló", action);
    }

    let (status, body) = request(
        &app,
        "POST",
        &format!("/api/vehicle/{}/delivered", vehicle_id),
        Some(json!({ "success": true })),
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["operational_status"], "delivered_ok");

    // el dashboard refleja la entrega de hoy
    let (_, body) =
        request(&app, "GET", "/rsexpress/opscenter/data", None, Some(API_KEY)).await;
    assert_eq!(body["kpi_completed_today"], 1);
    assert_eq!(body["kpi_active_orders"], 0);
    assert_eq!(body["vehicles"][0]["orders_completed"], 1);

    // vuelta a disponible
    let (status, body) = request(
        &app,
        "POST",
        &format!("/api/vehicle/{}/available", vehicle_id),
        None,
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["operational_status"], "available");
}

#[tokio::test]
async fn transicion_invalida_por_http_devuelve_400() {
    let (store, app) = test_app().await;
    let vehicle = store
        .create_vehicle(Vehicle::new("V-001".to_string(), "Moto-001".to_string()))
        .await
        .unwrap();

    let (status, body) = request(
        &app,
        "POST",
        &format!("/api/vehicle/{}/start-route", vehicle.id),
        None,
        Some(API_KEY),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn codigo_interno_duplicado_es_rechazado() {
    let (_store, app) = test_app().await;

    let payload = json!({ "internal_code": "V-001", "name": "Moto-001" });
    let (status, _) =
        request(&app, "POST", "/api/vehicle", Some(payload.clone()), Some(API_KEY)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(&app, "POST", "/api/vehicle", Some(payload), Some(API_KEY)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tracking_puntual_con_placeholders() {
    let (store, app) = test_app().await;
    let vehicle = store
        .create_vehicle(Vehicle::new("V-001".to_string(), "Moto-001".to_string()))
        .await
        .unwrap();

    let (status, body) = request(
        &app,
        "GET",
        &format!("/rsexpress/opscenter/tracking/{}", vehicle.id),
        None,
        Some(API_KEY),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latitude"], 0.0);
    assert_eq!(body["longitude"], 0.0);
    assert_eq!(body["address"], "Sin dirección");
    assert_eq!(body["traccar_status"], "unknown");
}

#[tokio::test]
async fn metricas_prometheus_expuestas() {
    let (_store, app) = test_app().await;
    let (status, body) = request(&app, "GET", "/metrics", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap_or_default().to_string();
    assert!(text.contains("rsexpress_webhook_events_total"));
    assert!(text.contains("rsexpress_sweep_runs_total"));
}
