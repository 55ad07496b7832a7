//! Builders for HTTP state ports from the configured adapters.

use std::sync::Arc;

use actix_web::web;
use tracing::info;

use umarell::domain::ports::{NotificationPublisher, RecordStore};
use umarell::domain::{RegistryService, SearchService};
use umarell::inbound::http::state::HttpState;
use umarell::outbound::memory::{InMemoryBroker, InMemoryRecordStore};
use umarell::outbound::persistence::DieselRecordStore;
use umarell::outbound::pubsub::PubSubHttpClient;

use super::ServerConfig;

fn build_store(config: &ServerConfig) -> Arc<dyn RecordStore> {
    match &config.db_pool {
        Some(pool) => Arc::new(DieselRecordStore::new(pool.clone())),
        None => {
            info!("no database configured, records live in process memory");
            Arc::new(InMemoryRecordStore::new())
        }
    }
}

fn build_publisher(config: &ServerConfig) -> std::io::Result<Arc<dyn NotificationPublisher>> {
    match &config.pubsub {
        Some(pubsub) => {
            let client = PubSubHttpClient::new(pubsub.clone()).map_err(|err| {
                std::io::Error::other(format!("Pub/Sub client construction failed: {err}"))
            })?;
            Ok(Arc::new(client))
        }
        None => {
            info!("no Pub/Sub project configured, notifications stay in process");
            Ok(Arc::new(InMemoryBroker::new()))
        }
    }
}

/// Wire the registry and search services over the configured store and
/// publisher.
///
/// # Errors
/// Returns [`std::io::Error`] when the Pub/Sub client cannot be constructed.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let store = build_store(config);
    let publisher = build_publisher(config)?;
    let registry = RegistryService::new(Arc::clone(&store), publisher);
    let search = SearchService::new(store);
    Ok(web::Data::new(HttpState::new(
        Arc::new(registry),
        Arc::new(search),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use umarell::domain::ports::RecordRegistry;

    #[actix_web::test]
    async fn in_memory_state_round_trips_a_site() {
        let config = ServerConfig::new("127.0.0.1:0".parse().expect("addr"));
        let state = build_http_state(&config).expect("state");

        let payload = serde_json::json!({"address": "Via Roma", "postalCode": 20100});
        state
            .registry
            .create_site("1", &payload)
            .await
            .expect("create");
        let site = state.registry.get_site("1").await.expect("get");
        assert_eq!(site.address, "Via Roma");
    }
}
