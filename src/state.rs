//! Shared application state
//!
//! Estado compartido de la aplicación que se pasa a través del router de
//! Axum. Los servicios se construyen por-request a partir de estos handles
//! (todos son clones baratos de Arc).

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::EnvironmentConfig;
use crate::metrics::Metrics;
use crate::repositories::{FleetRepository, MemoryFleetRepository};
use crate::services::{
    DispatchService, NotificationService, SyncService, TraccarClient, WebhookService,
};
use crate::utils::errors::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub store: Arc<dyn FleetRepository>,
    pub traccar: Arc<TraccarClient>,
    pub notifier: NotificationService,
    pub metrics: Arc<Metrics>,
    sweep_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Construye el estado con el repositorio en memoria por defecto.
    /// Requiere un runtime tokio activo (el consumidor de notificaciones
    /// se lanza en background).
    pub fn new(config: EnvironmentConfig) -> AppResult<Self> {
        Self::with_store(config, Arc::new(MemoryFleetRepository::new()))
    }

    /// Variante con repositorio inyectado (tests, almacén durable externo)
    pub fn with_store(
        config: EnvironmentConfig,
        store: Arc<dyn FleetRepository>,
    ) -> AppResult<Self> {
        let traccar = Arc::new(TraccarClient::new(config.traccar.clone())?);
        Ok(Self {
            config,
            store,
            traccar,
            notifier: NotificationService::spawn(),
            metrics: Arc::new(Metrics::new()?),
            sweep_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn dispatch(&self) -> DispatchService {
        DispatchService::new(self.store.clone(), self.notifier.clone(), self.metrics.clone())
    }

    pub fn sync(&self) -> SyncService {
        SyncService::new(
            self.store.clone(),
            self.traccar.clone(),
            self.dispatch(),
            self.sweep_lock.clone(),
            self.metrics.clone(),
            self.config.sync_concurrency,
        )
    }

    pub fn webhook(&self) -> WebhookService {
        WebhookService::new(self.store.clone(), self.dispatch(), self.metrics.clone())
    }
}
