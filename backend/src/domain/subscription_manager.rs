//! Filtered subscription lifecycle for the site-notification topic.
//!
//! The manager recreates the well-known subscription with a postal-code
//! filter, then pulls deliveries one batch at a time. Each delivery is handed
//! to a [`NotificationHandler`] and acknowledged only after the handler
//! succeeded; anything else is left for the broker to redeliver.
//!
//! The broker offers no acknowledgement that a subscription has been torn down
//! or become active, so provisioning waits a fixed settling interval after
//! both the delete and the create.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ports::{NotificationHandler, ReceivedMessage, SubscriptionBroker, SubscriptionBrokerError};
use super::{CAP_ATTRIBUTE, PostalCode, PostalCodeFilter, PostalCodeValidationError, TraceId};

/// Topic site notifications are published on.
pub const DEFAULT_TOPIC: &str = "cantieri";
/// Subscription recreated by every subscriber run.
pub const DEFAULT_SUBSCRIPTION: &str = "cantieri_sub";
/// Wait after subscription teardown and after creation.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);
/// Upper bound on deliveries requested per pull.
pub const DEFAULT_MAX_MESSAGES: usize = 10;

/// Lifecycle of a subscriber run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    /// Nothing provisioned yet.
    NoSubscription,
    /// Recreating the subscription.
    Provisioning,
    /// Pulling deliveries.
    Listening,
    /// Finishing after cancellation.
    Draining,
    /// The run is over.
    Stopped,
}

/// Subscription coordinates and pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSettings {
    /// Topic the subscription is bound to.
    pub topic: String,
    /// Subscription name, deleted and recreated on provisioning.
    pub subscription: String,
    /// Pause after the delete and after the create.
    pub settle_delay: Duration,
    /// Largest batch requested per pull.
    pub max_messages: usize,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_owned(),
            subscription: DEFAULT_SUBSCRIPTION.to_owned(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }
}

/// Why a subscriber run could not start or continue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriberError {
    /// A postal code in the filter argument is malformed.
    #[error("invalid postal code {entry:?} in filter list: {source}")]
    InvalidPostalCode {
        /// The offending list entry.
        entry: String,
        /// Why it was rejected.
        source: PostalCodeValidationError,
    },
    /// The subscription could not be deleted or created.
    #[error("failed to provision subscription {subscription}: {source}")]
    SubscriptionProvisioningFailed {
        /// Subscription being worked on.
        subscription: String,
        /// Broker failure.
        source: SubscriptionBrokerError,
    },
    /// Pulling deliveries failed for a reason other than a timeout.
    #[error("failed to pull from {subscription}: {source}")]
    PullFailed {
        /// Subscription being worked on.
        subscription: String,
        /// Broker failure.
        source: SubscriptionBrokerError,
    },
}

/// A site notification as seen by the subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredSite {
    /// Broker-assigned message identifier.
    pub message_id: String,
    /// Site address decoded from the message body.
    pub body: String,
    /// Value of the `cap` attribute.
    pub cap: String,
    /// When the broker accepted the message, if reported.
    pub publish_time: Option<DateTime<Utc>>,
}

impl DeliveredSite {
    fn from_message(message: &ReceivedMessage) -> Result<Self, String> {
        let body = String::from_utf8(message.data.clone())
            .map_err(|err| format!("body is not valid UTF-8: {err}"))?;
        let cap = message
            .attributes
            .get(CAP_ATTRIBUTE)
            .cloned()
            .ok_or_else(|| format!("missing `{CAP_ATTRIBUTE}` attribute"))?;
        Ok(Self {
            message_id: message.message_id.clone(),
            body,
            cap,
            publish_time: message.publish_time,
        })
    }
}

/// Parse a comma-separated postal-code list into a subscription filter.
///
/// A blank argument means "no filter". Every non-blank entry must be a valid
/// postal code; duplicates are dropped.
///
/// # Examples
/// ```
/// use umarell::domain::parse_postal_code_list;
///
/// let filter = parse_postal_code_list("20100, 20200").expect("valid list");
/// assert_eq!(filter.postal_codes().len(), 2);
/// assert!(parse_postal_code_list("20100,abc").is_err());
/// assert!(parse_postal_code_list("").expect("blank").postal_codes().is_empty());
/// ```
pub fn parse_postal_code_list(raw: &str) -> Result<PostalCodeFilter, SubscriberError> {
    if raw.trim().is_empty() {
        return Ok(PostalCodeFilter::any());
    }
    let codes = raw
        .split(',')
        .map(|entry| {
            entry
                .parse::<PostalCode>()
                .map_err(|source| SubscriberError::InvalidPostalCode {
                    entry: entry.to_owned(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PostalCodeFilter::only(codes))
}

/// Drives one subscriber run over an injected broker and handler.
pub struct SubscriptionManager<B: ?Sized, H: ?Sized> {
    broker: Arc<B>,
    handler: Arc<H>,
    settings: SubscriptionSettings,
    state: watch::Sender<SubscriberState>,
}

impl<B, H> SubscriptionManager<B, H>
where
    B: SubscriptionBroker + ?Sized,
    H: NotificationHandler + ?Sized,
{
    /// Build a manager in [`SubscriberState::NoSubscription`].
    pub fn new(broker: Arc<B>, handler: Arc<H>, settings: SubscriptionSettings) -> Self {
        let (state, _) = watch::channel(SubscriberState::NoSubscription);
        Self {
            broker,
            handler,
            settings,
            state,
        }
    }

    /// Observe state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SubscriberState> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> SubscriberState {
        *self.state.borrow()
    }

    fn transition(&self, next: SubscriberState) {
        let previous = self.state.send_replace(next);
        debug!(?previous, ?next, "subscriber state changed");
    }

    /// Provision, then listen until cancelled.
    ///
    /// Returns the number of acknowledged deliveries.
    pub async fn run(
        &self,
        filter: &PostalCodeFilter,
        cancel: CancellationToken,
    ) -> Result<usize, SubscriberError> {
        self.provision(filter).await?;
        self.listen(cancel).await
    }

    /// Recreate the subscription with `filter`.
    pub async fn provision(&self, filter: &PostalCodeFilter) -> Result<(), SubscriberError> {
        let subscription = self.settings.subscription.as_str();
        self.transition(SubscriberState::Provisioning);

        match self.broker.delete_subscription(subscription).await {
            Ok(()) => info!(subscription, "deleted previous subscription"),
            Err(SubscriptionBrokerError::NotFound { .. }) => {
                debug!(subscription, "no previous subscription to delete");
            }
            Err(source) => return Err(self.provisioning_failed(source)),
        }
        tokio::time::sleep(self.settings.settle_delay).await;

        let expr = filter.to_expr();
        if let Err(source) = self
            .broker
            .create_subscription(subscription, &self.settings.topic, &expr)
            .await
        {
            return Err(self.provisioning_failed(source));
        }
        info!(subscription, topic = %self.settings.topic, filter = %expr, "subscription created");
        tokio::time::sleep(self.settings.settle_delay).await;
        Ok(())
    }

    fn provisioning_failed(&self, source: SubscriptionBrokerError) -> SubscriberError {
        self.transition(SubscriberState::Stopped);
        SubscriberError::SubscriptionProvisioningFailed {
            subscription: self.settings.subscription.clone(),
            source,
        }
    }

    /// Pull and dispatch deliveries until `cancel` fires.
    ///
    /// A pull that times out counts as an empty batch. Cancellation is observed
    /// between pulls and between messages; a message already handed to the
    /// handler completes first. Returns the number of acknowledged deliveries.
    pub async fn listen(&self, cancel: CancellationToken) -> Result<usize, SubscriberError> {
        let subscription = self.settings.subscription.as_str();
        self.transition(SubscriberState::Listening);
        info!(subscription, "listening for site notifications");

        let mut acknowledged = 0;
        'pull: loop {
            let pulled = tokio::select! {
                biased;
                () = cancel.cancelled() => break 'pull,
                pulled = self.broker.pull(subscription, self.settings.max_messages) => pulled,
            };

            let batch = match pulled {
                Ok(batch) => batch,
                Err(SubscriptionBrokerError::Timeout { message }) => {
                    debug!(subscription, reason = %message, "pull deadline elapsed, pulling again");
                    continue 'pull;
                }
                Err(source) => {
                    self.transition(SubscriberState::Stopped);
                    return Err(SubscriberError::PullFailed {
                        subscription: subscription.to_owned(),
                        source,
                    });
                }
            };

            for message in batch {
                if cancel.is_cancelled() {
                    break 'pull;
                }
                if self.deliver(message).await {
                    acknowledged += 1;
                }
            }
        }

        self.transition(SubscriberState::Draining);
        info!(subscription, acknowledged, "subscriber draining");
        self.transition(SubscriberState::Stopped);
        Ok(acknowledged)
    }

    async fn deliver(&self, message: ReceivedMessage) -> bool {
        let subscription = self.settings.subscription.as_str();
        TraceId::scope(TraceId::generate(), async {
            let delivery = match DeliveredSite::from_message(&message) {
                Ok(delivery) => delivery,
                Err(reason) => {
                    warn!(message_id = %message.message_id, %reason, "leaving undecodable delivery unacknowledged");
                    return false;
                }
            };
            if let Err(err) = self.handler.handle(&delivery).await {
                warn!(message_id = %delivery.message_id, error = %err, "handler failed, delivery left for redelivery");
                return false;
            }
            match self.broker.acknowledge(subscription, &message.ack_id).await {
                Ok(()) => {
                    debug!(message_id = %delivery.message_id, cap = %delivery.cap, "delivery acknowledged");
                    true
                }
                Err(err) => {
                    warn!(message_id = %delivery.message_id, error = %err, "acknowledgement failed");
                    false
                }
            }
        })
        .await
    }
}

#[cfg(test)]
#[path = "subscription_manager_tests.rs"]
mod tests;
