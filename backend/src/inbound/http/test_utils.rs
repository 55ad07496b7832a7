//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::Trace;
use crate::domain::ports::{MockRecordRegistry, MockRecordSearch};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::configure;

/// Wrap mocks into shared handler state.
pub fn mock_state(registry: MockRecordRegistry, search: MockRecordSearch) -> web::Data<HttpState> {
    web::Data::new(HttpState::new(Arc::new(registry), Arc::new(search)))
}

/// App exposing every registry and search route over `state`.
pub fn test_app(
    state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .wrap(Trace)
        .configure(configure)
}
