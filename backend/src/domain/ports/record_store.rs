//! Driven port over the keyed document store holding both record kinds.
//!
//! The store is schemaless: documents are JSON values addressed by
//! collection and [`RecordId`]. `set` overwrites; `insert_new` is the
//! create-only write the registry service relies on.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde_json::Value;

use crate::domain::{Collection, RecordId};

use super::define_port_error;

define_port_error! {
    /// Failures raised by record store adapters.
    pub enum RecordStoreError {
        /// The store could not be reached.
        Connection { message: String } => "record store connection failed: {message}",
        /// A read or write failed while executing.
        Query { message: String } => "record store query failed: {message}",
    }
}

/// A document together with its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Identifier within the collection.
    pub id: RecordId,
    /// Raw document body.
    pub document: Value,
}

/// Lazily produced query results, in ascending identifier order.
pub type RecordStream = BoxStream<'static, Result<StoredDocument, RecordStoreError>>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one document.
    async fn get(
        &self,
        collection: Collection,
        id: RecordId,
    ) -> Result<Option<Value>, RecordStoreError>;

    /// Whether a document exists under `id`.
    async fn exists(&self, collection: Collection, id: RecordId) -> Result<bool, RecordStoreError>;

    /// Create or overwrite a document.
    async fn set(
        &self,
        collection: Collection,
        id: RecordId,
        document: Value,
    ) -> Result<(), RecordStoreError>;

    /// Store a document only when `id` is free. Returns `false`, leaving the
    /// existing document untouched, when it is taken.
    async fn insert_new(
        &self,
        collection: Collection,
        id: RecordId,
        document: Value,
    ) -> Result<bool, RecordStoreError>;

    /// Every identifier in the collection, ascending.
    async fn list_ids(&self, collection: Collection) -> Result<Vec<RecordId>, RecordStoreError>;

    /// Remove a document. Removing a missing document is not an error.
    async fn delete(&self, collection: Collection, id: RecordId) -> Result<(), RecordStoreError>;

    /// Documents whose top-level `field` equals `value`.
    async fn query(
        &self,
        collection: Collection,
        field: &str,
        value: Value,
    ) -> Result<RecordStream, RecordStoreError>;
}
