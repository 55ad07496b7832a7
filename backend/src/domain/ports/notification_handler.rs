//! Callback port invoked by the subscription manager for each delivery.

use async_trait::async_trait;

use crate::domain::DeliveredSite;

use super::define_port_error;

define_port_error! {
    /// Failures that leave a delivery unacknowledged.
    pub enum HandlerError {
        /// The handler could not process the delivery.
        Failed { message: String } => "notification handler failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    /// Process one delivery. Returning `Ok` allows the manager to acknowledge
    /// it; the same delivery may be seen more than once.
    async fn handle(&self, delivery: &DeliveredSite) -> Result<(), HandlerError>;
}
