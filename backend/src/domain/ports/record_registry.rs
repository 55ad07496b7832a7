//! Driving port for creating, reading, and clearing registry records.
//!
//! Identifiers and payloads arrive raw (path segment and JSON body) so that
//! validation happens once, inside the domain, for every inbound adapter.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{ConstructionSite, RegistryError, Watcher};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordRegistry: Send + Sync {
    /// Read a watcher.
    ///
    /// # Errors
    /// [`RegistryError::InvalidId`], [`RegistryError::NotFound`], or
    /// [`RegistryError::StoreUnavailable`].
    async fn get_watcher(&self, raw_id: &str) -> Result<Watcher, RegistryError>;

    /// Register a watcher under a fresh identifier.
    ///
    /// # Errors
    /// [`RegistryError::InvalidId`], [`RegistryError::ValidationFailed`],
    /// [`RegistryError::Conflict`], or [`RegistryError::StoreUnavailable`].
    async fn create_watcher(&self, raw_id: &str, payload: &Value)
    -> Result<Watcher, RegistryError>;

    /// Read a construction site.
    ///
    /// # Errors
    /// As for [`RecordRegistry::get_watcher`].
    async fn get_site(&self, raw_id: &str) -> Result<ConstructionSite, RegistryError>;

    /// Register a construction site and announce it on the broker.
    ///
    /// Resolves only after the broker acknowledged the notification.
    ///
    /// # Errors
    /// As for [`RecordRegistry::create_watcher`], plus
    /// [`RegistryError::PublishFailed`] when the site was stored but the
    /// notification was not accepted.
    async fn create_site(
        &self,
        raw_id: &str,
        payload: &Value,
    ) -> Result<ConstructionSite, RegistryError>;

    /// Delete every record of both kinds. Idempotent.
    ///
    /// # Errors
    /// [`RegistryError::StoreUnavailable`].
    async fn clear_all(&self) -> Result<(), RegistryError>;
}
