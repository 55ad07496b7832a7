//! Process-local message broker with Pub/Sub pull semantics.
//!
//! A single [`InMemoryBroker`] serves as both the publisher used by the
//! registry and the subscription broker used by the subscriber, so the whole
//! notification flow can run inside one process.
//!
//! Semantics mirror the managed service closely enough for the subscriber:
//! messages published before a subscription exists are dropped, each
//! subscription applies its filter on publish, pulled messages stay
//! outstanding until acknowledged, and anything not acknowledged within the
//! ack deadline is redelivered on a later pull.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::debug;

use crate::domain::ports::{
    MessageId, NotificationPublisher, PublishError, ReceivedMessage, SubscriptionBroker,
    SubscriptionBrokerError,
};
use crate::domain::{DEFAULT_TOPIC, FilterExpr, SiteNotification};

/// How long an empty pull waits for a publish before returning no messages.
pub const DEFAULT_PULL_WAIT: Duration = Duration::from_secs(1);

/// How long a pulled message may stay unacknowledged before redelivery.
pub const DEFAULT_ACK_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug)]
struct Outstanding {
    message: ReceivedMessage,
    deadline: Instant,
}

#[derive(Debug)]
struct Subscription {
    topic: String,
    filter: FilterExpr,
    pending: VecDeque<ReceivedMessage>,
    outstanding: BTreeMap<String, Outstanding>,
}

impl Subscription {
    fn requeue_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .outstanding
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(ack_id, _)| ack_id.clone())
            .collect();
        for ack_id in expired {
            if let Some(entry) = self.outstanding.remove(&ack_id) {
                self.pending.push_front(entry.message);
            }
        }
    }
}

#[derive(Debug, Default)]
struct BrokerState {
    subscriptions: BTreeMap<String, Subscription>,
    next_message: u64,
    next_ack: u64,
}

/// In-memory publisher and subscription broker.
///
/// # Examples
/// ```
/// use umarell::outbound::memory::InMemoryBroker;
///
/// let broker = InMemoryBroker::new().with_topic("cantieri");
/// assert_eq!(broker.topic(), "cantieri");
/// ```
#[derive(Debug)]
pub struct InMemoryBroker {
    topic: String,
    pull_wait: Duration,
    ack_deadline: Duration,
    state: Mutex<BrokerState>,
    published: Notify,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    /// Broker publishing to the default `cantieri` topic.
    pub fn new() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_owned(),
            pull_wait: DEFAULT_PULL_WAIT,
            ack_deadline: DEFAULT_ACK_DEADLINE,
            state: Mutex::new(BrokerState::default()),
            published: Notify::new(),
        }
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    #[must_use]
    pub fn with_pull_wait(mut self, pull_wait: Duration) -> Self {
        self.pull_wait = pull_wait;
        self
    }

    #[must_use]
    pub fn with_ack_deadline(mut self, ack_deadline: Duration) -> Self {
        self.ack_deadline = ack_deadline;
        self
    }

    /// Topic notifications are published to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    async fn take_batch(
        &self,
        subscription: &str,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, SubscriptionBrokerError> {
        let mut state = self.state.lock().await;
        let BrokerState {
            subscriptions,
            next_ack,
            ..
        } = &mut *state;
        let entry = subscriptions
            .get_mut(subscription)
            .ok_or_else(|| SubscriptionBrokerError::not_found(subscription))?;

        let now = Instant::now();
        entry.requeue_expired(now);

        let mut batch = Vec::new();
        while batch.len() < max_messages {
            let Some(mut message) = entry.pending.pop_front() else {
                break;
            };
            *next_ack += 1;
            message.ack_id = format!("{subscription}-ack-{next_ack}");
            entry.outstanding.insert(
                message.ack_id.clone(),
                Outstanding {
                    message: message.clone(),
                    deadline: now + self.ack_deadline,
                },
            );
            batch.push(message);
        }
        Ok(batch)
    }
}

#[async_trait]
impl NotificationPublisher for InMemoryBroker {
    async fn publish(&self, notification: &SiteNotification) -> Result<MessageId, PublishError> {
        let mut state = self.state.lock().await;
        state.next_message += 1;
        let message_id = state.next_message.to_string();
        let attributes: BTreeMap<String, String> = notification.attributes().into_iter().collect();
        let message = ReceivedMessage {
            ack_id: String::new(),
            message_id: message_id.clone(),
            data: notification.body().as_bytes().to_vec(),
            attributes,
            publish_time: Some(Utc::now()),
        };

        let mut routed = 0_usize;
        for entry in state.subscriptions.values_mut() {
            if entry.topic == self.topic && entry.filter.matches(&message.attributes) {
                entry.pending.push_back(message.clone());
                routed += 1;
            }
        }
        drop(state);

        debug!(topic = %self.topic, %message_id, routed, "notification published");
        self.published.notify_waiters();
        Ok(MessageId(message_id))
    }
}

#[async_trait]
impl SubscriptionBroker for InMemoryBroker {
    async fn delete_subscription(&self, subscription: &str) -> Result<(), SubscriptionBrokerError> {
        self.state
            .lock()
            .await
            .subscriptions
            .remove(subscription)
            .map(|_| ())
            .ok_or_else(|| SubscriptionBrokerError::not_found(subscription))
    }

    async fn create_subscription(
        &self,
        subscription: &str,
        topic: &str,
        filter: &FilterExpr,
    ) -> Result<(), SubscriptionBrokerError> {
        let mut state = self.state.lock().await;
        if state.subscriptions.contains_key(subscription) {
            return Err(SubscriptionBrokerError::already_exists(subscription));
        }
        state.subscriptions.insert(
            subscription.to_owned(),
            Subscription {
                topic: topic.to_owned(),
                filter: filter.clone(),
                pending: VecDeque::new(),
                outstanding: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn pull(
        &self,
        subscription: &str,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, SubscriptionBrokerError> {
        let give_up = Instant::now() + self.pull_wait;
        loop {
            // Registered before the check so a publish in between still wakes us.
            let published = self.published.notified();
            let batch = self.take_batch(subscription, max_messages).await?;
            if !batch.is_empty() {
                return Ok(batch);
            }
            if tokio::time::timeout_at(give_up, published).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn acknowledge(
        &self,
        subscription: &str,
        ack_id: &str,
    ) -> Result<(), SubscriptionBrokerError> {
        let mut state = self.state.lock().await;
        let entry = state
            .subscriptions
            .get_mut(subscription)
            .ok_or_else(|| SubscriptionBrokerError::not_found(subscription))?;
        // Unknown or expired ack ids are ignored, as the managed service does.
        entry.outstanding.remove(ack_id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
