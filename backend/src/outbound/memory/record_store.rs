//! Process-local record store used when no database is configured.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::ports::{RecordStore, RecordStoreError, RecordStream, StoredDocument};
use crate::domain::{Collection, RecordId};

/// [`RecordStore`] over an ordered map. Contents vanish with the process.
///
/// # Examples
/// ```
/// use umarell::outbound::memory::InMemoryRecordStore;
///
/// let store = InMemoryRecordStore::new();
/// # let _ = store;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    documents: RwLock<BTreeMap<(Collection, RecordId), Value>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(
        &self,
        collection: Collection,
        id: RecordId,
    ) -> Result<Option<Value>, RecordStoreError> {
        Ok(self.documents.read().await.get(&(collection, id)).cloned())
    }

    async fn exists(&self, collection: Collection, id: RecordId) -> Result<bool, RecordStoreError> {
        Ok(self.documents.read().await.contains_key(&(collection, id)))
    }

    async fn set(
        &self,
        collection: Collection,
        id: RecordId,
        document: Value,
    ) -> Result<(), RecordStoreError> {
        self.documents.write().await.insert((collection, id), document);
        Ok(())
    }

    async fn insert_new(
        &self,
        collection: Collection,
        id: RecordId,
        document: Value,
    ) -> Result<bool, RecordStoreError> {
        match self.documents.write().await.entry((collection, id)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(document);
                Ok(true)
            }
        }
    }

    async fn list_ids(&self, collection: Collection) -> Result<Vec<RecordId>, RecordStoreError> {
        Ok(self
            .documents
            .read()
            .await
            .keys()
            .filter(|(owner, _)| *owner == collection)
            .map(|(_, id)| *id)
            .collect())
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<(), RecordStoreError> {
        self.documents.write().await.remove(&(collection, id));
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        field: &str,
        value: Value,
    ) -> Result<RecordStream, RecordStoreError> {
        let matches: Vec<_> = self
            .documents
            .read()
            .await
            .iter()
            .filter(|((owner, _), document)| {
                *owner == collection && document.get(field) == Some(&value)
            })
            .map(|((_, id), document)| {
                Ok(StoredDocument {
                    id: *id,
                    document: document.clone(),
                })
            })
            .collect();
        Ok(stream::iter(matches).boxed())
    }
}
