//! Notificación al cliente
//!
//! Canal de salida best-effort hacia el cliente final (preparado para
//! WhatsApp vía Respond.io). La transición de estado que la origina se
//! confirma SIEMPRE, aunque la notificación falle: encolar es
//! fire-and-forget y el consumidor solo registra el resultado.

use tokio::sync::mpsc;

use crate::models::OperationalStatus;

/// Evento de entrega que dispara una notificación
#[derive(Debug, Clone)]
pub struct CustomerNotification {
    pub vehicle_name: String,
    pub order_code: Option<String>,
    pub event: OperationalStatus,
}

impl CustomerNotification {
    /// Mensaje hacia el cliente según el evento
    pub fn message(&self) -> &'static str {
        match self.event {
            OperationalStatus::DeliveredOk => "✅ Su paquete ha sido entregado exitosamente",
            OperationalStatus::DeliveredIssue => {
                "⚠️ Su paquete ha sido entregado con observaciones"
            }
            OperationalStatus::Failed => "❌ No se pudo completar la entrega",
            OperationalStatus::Cancelled => "🚫 La entrega ha sido cancelada",
            _ => "Actualización de entrega",
        }
    }
}

/// Cola de notificaciones desacoplada de las transiciones de estado
#[derive(Clone)]
pub struct NotificationService {
    tx: mpsc::UnboundedSender<CustomerNotification>,
}

impl NotificationService {
    /// Lanza el consumidor en background y devuelve el productor.
    ///
    /// El consumidor actual solo registra el mensaje generado; la
    /// integración con el proveedor de mensajería se conecta aquí.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<CustomerNotification>();

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                log::info!(
                    "📱 Notificación generada para pedido {}: {} (vehículo {})",
                    notification.order_code.as_deref().unwrap_or("-"),
                    notification.message(),
                    notification.vehicle_name
                );
            }
        });

        Self { tx }
    }

    /// Encola una notificación. Un fallo al encolar se registra y se
    /// descarta: jamás revierte la transición que lo originó.
    pub fn notify(&self, notification: CustomerNotification) {
        if let Err(e) = self.tx.send(notification) {
            log::warn!("⚠️ No se pudo encolar la notificación al cliente: {}", e);
        }
    }
}
