use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveTime, Utc};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};

use rsexpress_dispatch::config::EnvironmentConfig;
use rsexpress_dispatch::routes::create_app;
use rsexpress_dispatch::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚚 RSExpress Dispatch - Tracking GPS y despacho de flota");
    info!("========================================================");

    // Configuración: falla rápido si algo requerido falta
    let config = match EnvironmentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Error de configuración: {}", e);
            return Err(anyhow::anyhow!("Error de configuración: {}", e));
        }
    };

    let state = match AppState::new(config.clone()) {
        Ok(state) => state,
        Err(e) => {
            error!("❌ Error inicializando el estado: {}", e);
            return Err(anyhow::anyhow!("Error de inicialización: {}", e));
        }
    };

    // Barrido periódico de sincronización Traccar
    let sync = state.sync();
    let interval_secs = config.sync_interval_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match sync.sweep().await {
                Ok(summary) if !summary.skipped => {
                    info!(
                        "🔄 Sweep: {} éxitos, {} fallos de {}",
                        summary.succeeded, summary.failed, summary.total
                    );
                }
                Ok(_) => {}
                Err(e) => error!("❌ Error en el barrido de sincronización: {}", e),
            }
        }
    });

    // Corte de medianoche: reinicio de la distancia diaria
    let dispatch = state.dispatch();
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next_midnight = (now.date_naive() + chrono::Days::new(1))
                .and_time(NaiveTime::MIN)
                .and_utc();
            let wait = (next_midnight - now)
                .to_std()
                .unwrap_or(Duration::from_secs(60));
            tokio::time::sleep(wait).await;
            if let Err(e) = dispatch.reset_daily_distances().await {
                error!("❌ Error reiniciando distancias diarias: {}", e);
            }
        }
    });

    let app = create_app(state);

    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /test - Endpoint de prueba");
    info!("   GET  /metrics - Métricas Prometheus");
    info!("📡 Webhook Traccar (público):");
    info!("   POST /rsexpress/traccar/webhook - Push de posiciones");
    info!("📊 OpsCenter (X-API-Key requerida):");
    info!("   GET  /rsexpress/opscenter/data - Dashboard en tiempo real");
    info!("   GET  /rsexpress/opscenter/tracking - Mapa de flota");
    info!("   GET  /rsexpress/opscenter/tracking/:id - Tracking puntual");
    info!("   GET  /rsexpress/traccar/test - Test de conexión Traccar");
    info!("   POST /rsexpress/sync - Barrido manual");
    info!("🚗 Flota y despacho:");
    info!("   POST /api/vehicle - Alta de vehículo");
    info!("   GET  /api/vehicle - Listar vehículos");
    info!("   POST /api/vehicle/:id/assign|start-route|pickup|delivering");
    info!("   POST /api/vehicle/:id/delivered|fail|cancel|available");
    info!("   POST /api/order - Crear pedido");
    info!("   GET  /api/order - Listar pedidos");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
