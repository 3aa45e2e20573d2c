//! Servicios del sistema

pub mod dispatch_service;
pub mod notification_service;
pub mod opscenter_service;
pub mod sync_service;
pub mod traccar_client;
pub mod webhook_service;

pub use dispatch_service::DispatchService;
pub use notification_service::{CustomerNotification, NotificationService};
pub use sync_service::{SweepSummary, SyncService};
pub use traccar_client::TraccarClient;
pub use webhook_service::WebhookService;
