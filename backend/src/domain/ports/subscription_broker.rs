//! Driven port for subscription administration and message delivery.
//!
//! Mirrors the pull model of managed brokers: messages are pulled in batches,
//! each carries an acknowledgement id, and anything not acknowledged is
//! eventually redelivered.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::FilterExpr;

use super::define_port_error;

define_port_error! {
    /// Failures raised by subscription broker adapters.
    pub enum SubscriptionBrokerError {
        /// The named subscription (or its topic) does not exist.
        NotFound { name: String } => "subscription resource not found: {name}",
        /// The subscription name is already taken.
        AlreadyExists { name: String } => "subscription already exists: {name}",
        /// The broker did not answer in time.
        Timeout { message: String } => "broker request timed out: {message}",
        /// Transport or protocol failure.
        Transport { message: String } => "broker request failed: {message}",
    }
}

/// A message handed out by [`SubscriptionBroker::pull`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Token used to acknowledge this delivery.
    pub ack_id: String,
    /// Broker-assigned message identifier.
    pub message_id: String,
    /// Raw message body.
    pub data: Vec<u8>,
    /// Message attributes.
    pub attributes: BTreeMap<String, String>,
    /// When the broker accepted the message, if reported.
    pub publish_time: Option<DateTime<Utc>>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionBroker: Send + Sync {
    /// Delete a subscription. Missing subscriptions yield
    /// [`SubscriptionBrokerError::NotFound`].
    async fn delete_subscription(&self, subscription: &str) -> Result<(), SubscriptionBrokerError>;

    /// Create a subscription on `topic` delivering only messages accepted by
    /// `filter`.
    async fn create_subscription(
        &self,
        subscription: &str,
        topic: &str,
        filter: &FilterExpr,
    ) -> Result<(), SubscriptionBrokerError>;

    /// Wait for up to `max_messages` deliveries. May return an empty batch.
    async fn pull(
        &self,
        subscription: &str,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, SubscriptionBrokerError>;

    /// Acknowledge one delivery so it is not redelivered.
    async fn acknowledge(
        &self,
        subscription: &str,
        ack_id: &str,
    ) -> Result<(), SubscriptionBrokerError>;
}
