//! Driving port for postal-code search across both collections.

use async_trait::async_trait;

use crate::domain::{RegistryError, SearchQuery};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSearch: Send + Sync {
    /// Watcher names (when enabled) followed by site addresses (when enabled).
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>, RegistryError>;
}
