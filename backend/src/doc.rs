//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer together with
//! the schema wrappers from [`crate::inbound::http::schemas`]. The document is
//! served by Swagger UI in debug builds and exported by the `openapi-dump`
//! binary.

use utoipa::OpenApi;

use crate::inbound::http::schemas::{
    ConstructionSiteSchema, ErrorCodeSchema, ErrorSchema, WatcherSchema,
};
use crate::inbound::http::search::SearchResponse;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Umarell registry API",
        description = "Watchers, construction sites, postal-code search, and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::records::get_watcher,
        crate::inbound::http::records::create_watcher,
        crate::inbound::http::records::get_site,
        crate::inbound::http::records::create_site,
        crate::inbound::http::admin::clean,
        crate::inbound::http::search::search_records,
        crate::inbound::http::search::search_page,
        crate::inbound::http::search::search_submit,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        WatcherSchema,
        ConstructionSiteSchema,
        SearchResponse,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "umarell", description = "Site-watchers"),
        (name = "cantiere", description = "Construction sites"),
        (name = "search", description = "Postal-code search"),
        (name = "admin", description = "Maintenance"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
