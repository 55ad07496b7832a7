//! Reqwest-backed Pub/Sub adapter speaking the REST v1 API.
//!
//! Works against the managed service (with a bearer token) and against the
//! local emulator (plain HTTP, no credentials). The adapter owns transport
//! details only: URL building, request serialisation, timeouts and status
//! mapping.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use super::dto::{
    AcknowledgeRequestDto, CreateSubscriptionDto, OutgoingMessageDto, PublishRequestDto,
    PublishResponseDto, PullRequestDto, PullResponseDto,
};
use crate::domain::ports::{
    MessageId, NotificationPublisher, PublishError, ReceivedMessage, SubscriptionBroker,
    SubscriptionBrokerError,
};
use crate::domain::{DEFAULT_TOPIC, FilterExpr, SiteNotification};

/// Public endpoint of the managed service.
pub const DEFAULT_PUBSUB_ENDPOINT: &str = "https://pubsub.googleapis.com";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_PULL_TIMEOUT: Duration = Duration::from_secs(90);

/// Connection settings for [`PubSubHttpClient`].
#[derive(Debug, Clone)]
pub struct PubSubConfig {
    /// Base URL, e.g. `https://pubsub.googleapis.com` or `http://localhost:8085`.
    pub endpoint: Url,
    /// Project owning the topic and subscriptions.
    pub project: String,
    /// Topic notifications are published to.
    pub topic: String,
    /// Bearer token; `None` for the emulator.
    pub access_token: Option<String>,
    /// Timeout for administrative calls, publish and acknowledge.
    pub request_timeout: Duration,
    /// Timeout for one pull. Expiry surfaces as
    /// [`SubscriptionBrokerError::Timeout`].
    pub pull_timeout: Duration,
}

impl PubSubConfig {
    /// Settings for `project` on `endpoint` with default topic and timeouts.
    pub fn new(endpoint: Url, project: impl Into<String>) -> Self {
        Self {
            endpoint,
            project: project.into(),
            topic: DEFAULT_TOPIC.to_owned(),
            access_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            pull_timeout: DEFAULT_PULL_TIMEOUT,
        }
    }

    /// Settings pointing at an emulator listening on `host` (`host:port`).
    ///
    /// # Errors
    /// Returns an error when `host` does not form a valid URL.
    pub fn emulator(host: &str, project: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(&format!("http://{host}"))?, project))
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    #[must_use]
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    #[must_use]
    pub fn with_pull_timeout(mut self, timeout: Duration) -> Self {
        self.pull_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Pub/Sub adapter implementing both broker-facing ports.
pub struct PubSubHttpClient {
    client: Client,
    config: PubSubConfig,
}

impl PubSubHttpClient {
    /// Build the adapter.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: PubSubConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn topic_path(&self) -> String {
        format!("projects/{}/topics/{}", self.config.project, self.config.topic)
    }

    fn subscription_path(&self, subscription: &str) -> String {
        format!("projects/{}/subscriptions/{subscription}", self.config.project)
    }

    fn resource_url(&self, resource: &str) -> Result<Url, url::ParseError> {
        let base = self.config.endpoint.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/v1/{resource}"))
    }

    fn request(&self, method: Method, url: Url, timeout: Duration) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .timeout(timeout)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.config.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_admin<B: Serialize + Sync>(
        &self,
        method: Method,
        subscription: &str,
        suffix: &str,
        body: Option<&B>,
        timeout: Duration,
    ) -> Result<Vec<u8>, SubscriptionBrokerError> {
        let resource = format!("{}{suffix}", self.subscription_path(subscription));
        let url = self
            .resource_url(&resource)
            .map_err(|err| SubscriptionBrokerError::transport(format!("invalid URL: {err}")))?;
        let builder = self.request(method, url, timeout);
        let builder = match body {
            Some(payload) => builder.json(payload),
            None => builder,
        };
        let response = builder.send().await.map_err(map_broker_transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_broker_transport)?;
        if !status.is_success() {
            return Err(map_broker_status(status, subscription, &bytes));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl NotificationPublisher for PubSubHttpClient {
    async fn publish(&self, notification: &SiteNotification) -> Result<MessageId, PublishError> {
        let url = self
            .resource_url(&format!("{}:publish", self.topic_path()))
            .map_err(|err| PublishError::rejected(format!("invalid URL: {err}")))?;
        let attributes = notification.attributes();
        let payload = PublishRequestDto {
            messages: vec![OutgoingMessageDto::new(
                notification.body().as_bytes(),
                &attributes,
            )],
        };

        let response = self
            .request(Method::POST, url, self.config.request_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|err| PublishError::unavailable(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| PublishError::unavailable(err.to_string()))?;
        if !status.is_success() {
            return Err(map_publish_status(status, &bytes));
        }

        let decoded: PublishResponseDto = serde_json::from_slice(&bytes)
            .map_err(|err| PublishError::rejected(format!("invalid publish response: {err}")))?;
        let message_id = decoded
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| PublishError::rejected("publish response carried no message id"))?;
        debug!(topic = %self.config.topic, %message_id, "notification published");
        Ok(MessageId(message_id))
    }
}

#[async_trait]
impl SubscriptionBroker for PubSubHttpClient {
    async fn delete_subscription(&self, subscription: &str) -> Result<(), SubscriptionBrokerError> {
        self.send_admin::<()>(
            Method::DELETE,
            subscription,
            "",
            None,
            self.config.request_timeout,
        )
        .await
        .map(|_| ())
    }

    async fn create_subscription(
        &self,
        subscription: &str,
        topic: &str,
        filter: &FilterExpr,
    ) -> Result<(), SubscriptionBrokerError> {
        let topic_path = format!("projects/{}/topics/{topic}", self.config.project);
        let payload = CreateSubscriptionDto {
            topic: &topic_path,
            filter: filter.to_string(),
        };
        self.send_admin(
            Method::PUT,
            subscription,
            "",
            Some(&payload),
            self.config.request_timeout,
        )
        .await
        .map(|_| ())
    }

    async fn pull(
        &self,
        subscription: &str,
        max_messages: usize,
    ) -> Result<Vec<ReceivedMessage>, SubscriptionBrokerError> {
        let payload = PullRequestDto { max_messages };
        let bytes = self
            .send_admin(
                Method::POST,
                subscription,
                ":pull",
                Some(&payload),
                self.config.pull_timeout,
            )
            .await?;
        let decoded: PullResponseDto = serde_json::from_slice(&bytes).map_err(|err| {
            SubscriptionBrokerError::transport(format!("invalid pull response: {err}"))
        })?;
        decoded
            .into_messages()
            .map_err(SubscriptionBrokerError::transport)
    }

    async fn acknowledge(
        &self,
        subscription: &str,
        ack_id: &str,
    ) -> Result<(), SubscriptionBrokerError> {
        let payload = AcknowledgeRequestDto { ack_ids: [ack_id] };
        self.send_admin(
            Method::POST,
            subscription,
            ":acknowledge",
            Some(&payload),
            self.config.request_timeout,
        )
        .await
        .map(|_| ())
    }
}

fn map_broker_transport(error: reqwest::Error) -> SubscriptionBrokerError {
    if error.is_timeout() {
        SubscriptionBrokerError::timeout(error.to_string())
    } else {
        SubscriptionBrokerError::transport(error.to_string())
    }
}

fn map_broker_status(status: StatusCode, subscription: &str, body: &[u8]) -> SubscriptionBrokerError {
    match status {
        StatusCode::NOT_FOUND => SubscriptionBrokerError::not_found(subscription),
        StatusCode::CONFLICT => SubscriptionBrokerError::already_exists(subscription),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            SubscriptionBrokerError::timeout(status_message(status, body))
        }
        _ => SubscriptionBrokerError::transport(status_message(status, body)),
    }
}

fn map_publish_status(status: StatusCode, body: &[u8]) -> PublishError {
    let message = status_message(status, body);
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        PublishError::rejected(message)
    } else {
        PublishError::unavailable(message)
    }
}

fn status_message(status: StatusCode, body: &[u8]) -> String {
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
