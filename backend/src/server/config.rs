//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use umarell::outbound::persistence::DbPool;
use umarell::outbound::pubsub::PubSubConfig;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) pubsub: Option<PubSubConfig>,
}

impl ServerConfig {
    /// Configuration with in-memory adapters bound to `bind_addr`.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            pubsub: None,
        }
    }

    /// Attach a database connection pool; records are then stored in
    /// PostgreSQL instead of process memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Publish site notifications to Pub/Sub instead of the in-memory broker.
    #[must_use]
    pub fn with_pubsub(mut self, pubsub: Option<PubSubConfig>) -> Self {
        self.pubsub = pubsub;
        self
    }
}
