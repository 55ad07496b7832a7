//! Registry use-cases over the record store and the notification publisher.
//!
//! Creation is check-then-set: an existing identifier is a conflict and the
//! stored document is never overwritten. Site creation publishes exactly one
//! notification after the write and waits for the broker to acknowledge it;
//! when publishing fails the stored site is kept.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use super::ports::{NotificationPublisher, RecordRegistry, RecordStore, RecordStoreError};
use super::{
    Collection, ConstructionSite, RecordId, RegistryError, SiteNotification, ValidationErrors,
    Watcher, validate_site, validate_watcher,
};

/// Registry service implementing [`RecordRegistry`].
pub struct RegistryService<S: ?Sized, P: ?Sized> {
    store: Arc<S>,
    publisher: Arc<P>,
}

impl<S: ?Sized, P: ?Sized> Clone for RegistryService<S, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            publisher: Arc::clone(&self.publisher),
        }
    }
}

impl<S: ?Sized, P: ?Sized> RegistryService<S, P> {
    /// Create a service over an injected store and publisher.
    pub fn new(store: Arc<S>, publisher: Arc<P>) -> Self {
        Self { store, publisher }
    }
}

impl<S, P> RegistryService<S, P>
where
    S: RecordStore + ?Sized,
    P: NotificationPublisher + ?Sized,
{
    fn parse_id(collection: Collection, raw_id: &str) -> Result<RecordId, RegistryError> {
        RecordId::parse(raw_id).map_err(|reason| RegistryError::InvalidId { collection, reason })
    }

    async fn read<T>(&self, collection: Collection, raw_id: &str) -> Result<T, RegistryError>
    where
        T: DeserializeOwned,
    {
        let id = Self::parse_id(collection, raw_id)?;
        let document = self
            .store
            .get(collection, id)
            .await?
            .ok_or(RegistryError::NotFound { collection, id })?;
        serde_json::from_value(document).map_err(|err| {
            RegistryError::StoreUnavailable(RecordStoreError::query(format!(
                "stored {collection} {id} is malformed: {err}"
            )))
        })
    }

    async fn insert<T, V>(
        &self,
        collection: Collection,
        raw_id: &str,
        payload: &Value,
        validate: V,
    ) -> Result<(RecordId, T), RegistryError>
    where
        T: Serialize,
        V: FnOnce(&Value) -> Result<T, ValidationErrors>,
    {
        let id = Self::parse_id(collection, raw_id)?;
        let record = validate(payload).map_err(|errors| RegistryError::ValidationFailed {
            subject: collection.as_str(),
            errors,
        })?;

        if self.store.exists(collection, id).await? {
            debug!(%collection, %id, "create rejected: identifier taken");
            return Err(RegistryError::Conflict { collection, id });
        }

        let document = serde_json::to_value(&record).map_err(|err| {
            RegistryError::StoreUnavailable(RecordStoreError::query(format!(
                "failed to encode {collection} {id}: {err}"
            )))
        })?;
        if !self.store.insert_new(collection, id, document).await? {
            debug!(%collection, %id, "create rejected: identifier taken concurrently");
            return Err(RegistryError::Conflict { collection, id });
        }
        info!(%collection, %id, "record created");
        Ok((id, record))
    }
}

#[async_trait]
impl<S, P> RecordRegistry for RegistryService<S, P>
where
    S: RecordStore + ?Sized,
    P: NotificationPublisher + ?Sized,
{
    async fn get_watcher(&self, raw_id: &str) -> Result<Watcher, RegistryError> {
        self.read(Collection::Watchers, raw_id).await
    }

    async fn create_watcher(
        &self,
        raw_id: &str,
        payload: &Value,
    ) -> Result<Watcher, RegistryError> {
        let (_, watcher) = self
            .insert(Collection::Watchers, raw_id, payload, validate_watcher)
            .await?;
        Ok(watcher)
    }

    async fn get_site(&self, raw_id: &str) -> Result<ConstructionSite, RegistryError> {
        self.read(Collection::Sites, raw_id).await
    }

    async fn create_site(
        &self,
        raw_id: &str,
        payload: &Value,
    ) -> Result<ConstructionSite, RegistryError> {
        let (id, site) = self
            .insert(Collection::Sites, raw_id, payload, validate_site)
            .await?;

        let notification = SiteNotification::for_site(&site);
        let message_id = self
            .publisher
            .publish(&notification)
            .await
            .map_err(|source| RegistryError::PublishFailed { id, source })?;
        info!(%id, %message_id, cap = %site.postal_code, "site notification published");
        Ok(site)
    }

    async fn clear_all(&self) -> Result<(), RegistryError> {
        for collection in Collection::ALL {
            let ids = self.store.list_ids(collection).await?;
            let removed = ids.len();
            for id in ids {
                self.store.delete(collection, id).await?;
            }
            info!(%collection, removed, "collection cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "registry_service_tests.rs"]
mod tests;
