//! Shared helpers for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`; this
//! module wires the real services over the in-memory adapters so each test
//! exercises the full stack without external infrastructure.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use umarell::Trace;
use umarell::domain::{RegistryService, SearchService};
use umarell::inbound::http::configure;
use umarell::inbound::http::state::HttpState;
use umarell::outbound::memory::{InMemoryBroker, InMemoryRecordStore};

/// Services and adapters shared by one test.
pub struct Stack {
    pub broker: Arc<InMemoryBroker>,
    pub state: web::Data<HttpState>,
}

impl Stack {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryRecordStore::new());
        let broker = Arc::new(InMemoryBroker::new());
        let registry = RegistryService::new(Arc::clone(&store), Arc::clone(&broker));
        let search = SearchService::new(Arc::clone(&store));
        let state = web::Data::new(HttpState::new(Arc::new(registry), Arc::new(search)));
        Self { broker, state }
    }

    /// App exposing the registry routes over this stack.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.state.clone())
            .wrap(Trace)
            .configure(configure)
    }
}
