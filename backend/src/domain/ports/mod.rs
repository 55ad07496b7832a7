//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports ([`RecordRegistry`], [`RecordSearch`]) are consumed by
//! inbound adapters; driven ports ([`RecordStore`], [`NotificationPublisher`],
//! [`SubscriptionBroker`], [`NotificationHandler`]) are implemented by
//! outbound adapters or by the binaries.

mod macros;
pub(crate) use macros::define_port_error;

mod notification_handler;
mod notification_publisher;
mod record_registry;
mod record_search;
mod record_store;
mod subscription_broker;

#[cfg(test)]
pub use notification_handler::MockNotificationHandler;
pub use notification_handler::{HandlerError, NotificationHandler};
#[cfg(test)]
pub use notification_publisher::MockNotificationPublisher;
pub use notification_publisher::{MessageId, NotificationPublisher, PublishError};
#[cfg(test)]
pub use record_registry::MockRecordRegistry;
pub use record_registry::RecordRegistry;
#[cfg(test)]
pub use record_search::MockRecordSearch;
pub use record_search::RecordSearch;
#[cfg(test)]
pub use record_store::MockRecordStore;
pub use record_store::{RecordStore, RecordStoreError, RecordStream, StoredDocument};
#[cfg(test)]
pub use subscription_broker::MockSubscriptionBroker;
pub use subscription_broker::{ReceivedMessage, SubscriptionBroker, SubscriptionBrokerError};
