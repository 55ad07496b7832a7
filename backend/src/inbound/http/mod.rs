//! HTTP inbound adapter exposing the REST API and the search page.

pub mod admin;
pub mod error;
pub mod health;
pub mod records;
pub mod schemas;
pub mod search;
pub mod state;
#[cfg(test)]
pub mod test_utils;

use actix_web::web;
use serde_json::json;

pub use error::ApiResult;

use crate::domain::{Error, SCHEMA_FIELD};

/// JSON extractor configuration that reports unreadable bodies with the
/// shared error envelope instead of Actix's plain-text default.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        Error::invalid_request("request body is not valid JSON")
            .with_details(json!({
                "code": "validation_failed",
                "errors": [{ "field": SCHEMA_FIELD, "reason": err.to_string() }],
            }))
            .into()
    })
}

/// Register the registry API under `/api/v1` and the search page at `/`.
///
/// Handler state ([`state::HttpState`]) must be supplied by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::scope("/api/v1")
                .service(records::get_watcher)
                .service(records::create_watcher)
                .service(records::get_site)
                .service(records::create_site)
                .service(admin::clean)
                .service(search::search_records),
        )
        .service(search::search_page)
        .service(search::search_submit);
}
