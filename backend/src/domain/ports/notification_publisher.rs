//! Driven port for announcing new construction sites on the broker.

use async_trait::async_trait;

use crate::domain::SiteNotification;

use super::define_port_error;

define_port_error! {
    /// Failures raised while publishing a notification.
    pub enum PublishError {
        /// The broker could not be reached or did not answer in time.
        Unavailable { message: String } => "broker unavailable: {message}",
        /// The broker answered but refused the message.
        Rejected { message: String } => "broker rejected notification: {message}",
    }
}

/// Broker-assigned identifier of a published message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Publish `notification` and resolve once the broker has acknowledged it.
    async fn publish(&self, notification: &SiteNotification) -> Result<MessageId, PublishError>;
}
