//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on driving ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{RecordRegistry, RecordSearch};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub registry: Arc<dyn RecordRegistry>,
    pub search: Arc<dyn RecordSearch>,
}

impl HttpState {
    /// Construct state from the driving ports.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use umarell::domain::{RegistryService, SearchService};
    /// use umarell::inbound::http::state::HttpState;
    /// use umarell::outbound::memory::{InMemoryBroker, InMemoryRecordStore};
    ///
    /// let store = Arc::new(InMemoryRecordStore::new());
    /// let broker = Arc::new(InMemoryBroker::new());
    /// let state = HttpState::new(
    ///     Arc::new(RegistryService::new(store.clone(), broker)),
    ///     Arc::new(SearchService::new(store)),
    /// );
    /// let _registry = state.registry.clone();
    /// ```
    pub fn new(registry: Arc<dyn RecordRegistry>, search: Arc<dyn RecordSearch>) -> Self {
        Self { registry, search }
    }
}
