//! Process configuration loaded via OrthoConfig.
//!
//! Every field is optional; accessors supply the defaults. Unset database or
//! Pub/Sub settings select the in-memory adapters.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;

use crate::domain::{
    DEFAULT_MAX_MESSAGES, DEFAULT_SETTLE_DELAY, DEFAULT_SUBSCRIPTION, DEFAULT_TOPIC,
    SubscriptionSettings,
};
use crate::outbound::persistence::PoolConfig;
use crate::outbound::pubsub::{DEFAULT_PUBSUB_ENDPOINT, PubSubConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Errors raised while turning raw settings into adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// The bind address is not a socket address.
    #[error("invalid bind address {value:?}: {message}")]
    BindAddr { value: String, message: String },
    /// The Pub/Sub endpoint is not a URL.
    #[error("invalid Pub/Sub endpoint {value:?}: {message}")]
    Endpoint { value: String, message: String },
    /// A required setting is absent.
    #[error("{field} must be set")]
    Missing { field: &'static str },
}

fn pubsub_config(
    project: Option<&str>,
    endpoint: Option<&str>,
    access_token: Option<&String>,
    topic: &str,
) -> Result<Option<PubSubConfig>, SettingsError> {
    let Some(project) = project else {
        return Ok(None);
    };
    let raw = endpoint.unwrap_or(DEFAULT_PUBSUB_ENDPOINT);
    let url = Url::parse(raw).map_err(|err| SettingsError::Endpoint {
        value: raw.to_owned(),
        message: err.to_string(),
    })?;
    Ok(Some(
        PubSubConfig::new(url, project)
            .with_topic(topic)
            .with_access_token(access_token.cloned()),
    ))
}

/// Settings for the registry HTTP service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "UMARELL")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Pub/Sub project; the in-memory broker is used when unset.
    pub pubsub_project: Option<String>,
    /// Pub/Sub base URL, e.g. an emulator at `http://localhost:8085`.
    pub pubsub_endpoint: Option<String>,
    /// Bearer token sent to Pub/Sub.
    pub pubsub_access_token: Option<String>,
    /// Topic site notifications are published to.
    pub topic: Option<String>,
    /// Largest number of pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Idle connections kept open; `0` keeps none.
    pub db_min_idle: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub db_connection_timeout_secs: Option<u64>,
}

impl ServerSettings {
    /// Parsed bind address, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    /// [`SettingsError::BindAddr`] when the value is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or(DEFAULT_TOPIC)
    }

    /// Connection pool configuration, `None` when no database is set.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let database_url = self.database_url.as_deref()?;
        let mut config = PoolConfig::new(database_url);
        if let Some(max_size) = self.db_max_connections {
            config = config.with_max_size(max_size.max(1));
        }
        if let Some(min_idle) = self.db_min_idle {
            config = config.with_min_idle((min_idle > 0).then_some(min_idle));
        }
        if let Some(secs) = self.db_connection_timeout_secs {
            config = config.with_connection_timeout(Duration::from_secs(secs));
        }
        Some(config)
    }

    /// Pub/Sub adapter configuration, `None` when no project is set.
    ///
    /// # Errors
    /// [`SettingsError::Endpoint`] when the endpoint is not a URL.
    pub fn pubsub(&self) -> Result<Option<PubSubConfig>, SettingsError> {
        pubsub_config(
            self.pubsub_project.as_deref(),
            self.pubsub_endpoint.as_deref(),
            self.pubsub_access_token.as_ref(),
            self.topic(),
        )
    }
}

/// Settings for the `cantieri-subscriber` process.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CANTIERI_SUB")]
pub struct SubscriberSettings {
    /// Pub/Sub project owning the topic and subscription.
    pub pubsub_project: Option<String>,
    /// Pub/Sub base URL, e.g. an emulator at `http://localhost:8085`.
    pub pubsub_endpoint: Option<String>,
    /// Bearer token sent to Pub/Sub.
    pub pubsub_access_token: Option<String>,
    /// Topic the subscription is bound to.
    pub topic: Option<String>,
    /// Subscription recreated on every start.
    pub subscription: Option<String>,
    /// Pause after each provisioning step, in milliseconds.
    pub settle_delay_ms: Option<u64>,
    /// Largest batch requested per pull.
    pub max_messages: Option<usize>,
    /// Stop listening after this many seconds; unset listens until Ctrl-C.
    pub listen_timeout_secs: Option<u64>,
    /// Deadline of a single long-poll pull, in seconds. An expired pull is
    /// retried.
    pub pull_timeout_secs: Option<u64>,
}

impl SubscriberSettings {
    pub fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or(DEFAULT_TOPIC)
    }

    pub fn subscription(&self) -> &str {
        self.subscription.as_deref().unwrap_or(DEFAULT_SUBSCRIPTION)
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay_ms
            .map_or(DEFAULT_SETTLE_DELAY, Duration::from_millis)
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages.unwrap_or(DEFAULT_MAX_MESSAGES).max(1)
    }

    pub fn listen_timeout(&self) -> Option<Duration> {
        self.listen_timeout_secs.map(Duration::from_secs)
    }

    pub fn pull_timeout(&self) -> Option<Duration> {
        self.pull_timeout_secs.map(Duration::from_secs)
    }

    /// Settings handed to the subscription manager.
    pub fn subscription_settings(&self) -> SubscriptionSettings {
        SubscriptionSettings {
            topic: self.topic().to_owned(),
            subscription: self.subscription().to_owned(),
            settle_delay: self.settle_delay(),
            max_messages: self.max_messages(),
        }
    }

    /// Pub/Sub adapter configuration. The subscriber has no in-memory
    /// fallback, so a project is required.
    ///
    /// # Errors
    /// [`SettingsError::Missing`] without a project, [`SettingsError::Endpoint`]
    /// when the endpoint is not a URL.
    pub fn pubsub(&self) -> Result<PubSubConfig, SettingsError> {
        let config = pubsub_config(
            self.pubsub_project.as_deref(),
            self.pubsub_endpoint.as_deref(),
            self.pubsub_access_token.as_ref(),
            self.topic(),
        )?
        .ok_or(SettingsError::Missing {
            field: "CANTIERI_SUB_PUBSUB_PROJECT",
        })?;
        Ok(match self.pull_timeout() {
            Some(timeout) => config.with_pull_timeout(timeout),
            None => config,
        })
    }
}
