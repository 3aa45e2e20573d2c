//! Tests del barrido de sincronización: aislamiento por vehículo,
//! estados de conectividad y exclusión de barridos solapados

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::Mutex;

use rsexpress_dispatch::config::TraccarConfig;
use rsexpress_dispatch::metrics::Metrics;
use rsexpress_dispatch::models::{LinkStatus, Vehicle};
use rsexpress_dispatch::repositories::{FleetRepository, MemoryFleetRepository};
use rsexpress_dispatch::services::{
    DispatchService, NotificationService, SyncService, TraccarClient,
};
use rsexpress_dispatch::utils::errors::AppError;

/// Traccar simulado: el dispositivo 2 responde 500 en /positions para
/// verificar que su fallo no contamina al resto del lote
fn mock_traccar_router() -> Router {
    Router::new()
        .route(
            "/devices",
            get(|| async {
                Json(json!([
                    { "id": 1, "name": "Moto-001", "uniqueId": "IMEI001", "positionId": 11 },
                    { "id": 2, "name": "Moto-002", "uniqueId": "IMEI002", "positionId": 22 },
                    { "id": 3, "name": "Moto-003", "uniqueId": "IMEI003" }
                ]))
            }),
        )
        .route(
            "/positions",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                match params.get("id").map(String::as_str) {
                    Some("11") => Json(json!([
                        { "id": 11, "deviceId": 1, "latitude": 4.60971, "longitude": -74.08175,
                          "speed": 20.0, "fixTime": "2026-08-06T10:30:00Z" }
                    ]))
                    .into_response(),
                    Some("22") => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "disco lleno").into_response()
                    }
                    _ => Json(json!([])).into_response(),
                }
            }),
        )
}

async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

struct Harness {
    store: Arc<MemoryFleetRepository>,
    sync: SyncService,
    sweep_lock: Arc<Mutex<()>>,
}

async fn setup(base_url: String) -> Harness {
    let store = Arc::new(MemoryFleetRepository::new());
    let metrics = Arc::new(Metrics::new().unwrap());
    let dispatch = DispatchService::new(
        store.clone(),
        NotificationService::spawn(),
        metrics.clone(),
    );
    let client = Arc::new(
        TraccarClient::new(TraccarConfig {
            base_url,
            username: "admin".to_string(),
            password: "admin".to_string(),
            timeout_secs: 2,
            max_retries: 0,
        })
        .unwrap(),
    );
    let sweep_lock = Arc::new(Mutex::new(()));
    let sync = SyncService::new(
        store.clone(),
        client,
        dispatch,
        sweep_lock.clone(),
        metrics,
        4,
    );
    Harness {
        store,
        sync,
        sweep_lock,
    }
}

async fn seed_vehicle(store: &MemoryFleetRepository, code: &str, device_id: Option<i64>) -> Vehicle {
    let mut vehicle = Vehicle::new(code.to_string(), format!("Moto-{}", code));
    vehicle.traccar_device_id = device_id;
    store.create_vehicle(vehicle).await.unwrap()
}

#[tokio::test]
async fn el_fallo_de_un_vehiculo_no_aborta_el_lote() {
    let base = spawn_server(mock_traccar_router()).await;
    let harness = setup(base).await;

    let v1 = seed_vehicle(&harness.store, "V-001", Some(1)).await;
    let v2 = seed_vehicle(&harness.store, "V-002", Some(2)).await;
    let v3 = seed_vehicle(&harness.store, "V-003", Some(3)).await;
    // sin dispositivo: queda fuera del barrido
    seed_vehicle(&harness.store, "V-004", None).await;

    let summary = harness.sync.sweep().await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 2);
    assert!(!summary.skipped);

    // posición aplicada y enlace online
    let v1 = harness.store.get_vehicle(v1.id).await.unwrap().unwrap();
    assert_eq!(v1.last_latitude, Some(4.60971));
    assert_eq!(v1.link_status, LinkStatus::Online);

    // el que falló queda en estado desconocido, sin posición
    let v2 = harness.store.get_vehicle(v2.id).await.unwrap().unwrap();
    assert_eq!(v2.link_status, LinkStatus::Unknown);
    assert!(v2.last_latitude.is_none());

    // sin posición registrada todavía: offline, y NO cuenta como fallo
    let v3 = harness.store.get_vehicle(v3.id).await.unwrap().unwrap();
    assert_eq!(v3.link_status, LinkStatus::Offline);
}

#[tokio::test]
async fn un_barrido_en_curso_omite_al_segundo() {
    let base = spawn_server(mock_traccar_router()).await;
    let harness = setup(base).await;
    seed_vehicle(&harness.store, "V-001", Some(1)).await;

    let _in_progress = harness.sweep_lock.lock().await;

    let summary = harness.sync.sweep().await.unwrap();
    assert!(summary.skipped);
    assert_eq!(summary.total, 0);
}

#[tokio::test]
async fn sync_puntual_sin_dispositivo_configurado() {
    let base = spawn_server(mock_traccar_router()).await;
    let harness = setup(base).await;
    let vehicle = seed_vehicle(&harness.store, "V-001", None).await;

    let err = harness.sync.sync_vehicle(vehicle.id).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn sync_puntual_aplica_la_posicion() {
    let base = spawn_server(mock_traccar_router()).await;
    let harness = setup(base).await;
    let vehicle = seed_vehicle(&harness.store, "V-001", Some(1)).await;

    let updated = harness.sync.sync_vehicle(vehicle.id).await.unwrap();
    assert_eq!(updated.last_latitude, Some(4.60971));
    assert_eq!(updated.last_speed, Some(20.0));
    assert_eq!(updated.link_status, LinkStatus::Online);
}
