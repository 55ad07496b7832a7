//! Pub/Sub outbound adapter.
//!
//! A thin HTTP implementation of the `NotificationPublisher` and
//! `SubscriptionBroker` ports over the REST v1 API.

mod dto;
mod http_client;

pub use http_client::{DEFAULT_PUBSUB_ENDPOINT, PubSubConfig, PubSubHttpClient};
