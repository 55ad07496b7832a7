//! Record HTTP handlers.
//!
//! ```text
//! GET  /api/v1/umarell/{id}
//! POST /api/v1/umarell/{id}
//! GET  /api/v1/cantiere/{id}
//! POST /api/v1/cantiere/{id}
//! ```
//!
//! Identifiers and bodies are forwarded raw; the registry validates both so
//! that every inbound adapter reports the same field errors.

use actix_web::{HttpResponse, get, post, web};
use serde_json::Value;

use crate::domain::{ConstructionSite, Watcher};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ConstructionSiteSchema, ErrorSchema, WatcherSchema};
use crate::inbound::http::state::HttpState;

/// Fetch a watcher.
#[utoipa::path(
    get,
    path = "/api/v1/umarell/{id}",
    params(("id" = String, Path, description = "Positive integer identifier")),
    responses(
        (status = 200, description = "Watcher", body = WatcherSchema),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 404, description = "No watcher under this identifier", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["umarell"],
    operation_id = "getUmarell"
)]
#[get("/umarell/{id}")]
pub async fn get_watcher(
    state: web::Data<HttpState>,
    id: web::Path<String>,
) -> ApiResult<web::Json<Watcher>> {
    let watcher = state.registry.get_watcher(&id).await?;
    Ok(web::Json(watcher))
}

/// Register a watcher under a fresh identifier.
#[utoipa::path(
    post,
    path = "/api/v1/umarell/{id}",
    params(("id" = String, Path, description = "Positive integer identifier")),
    request_body = WatcherSchema,
    responses(
        (status = 201, description = "Watcher created", body = WatcherSchema),
        (status = 400, description = "Malformed identifier or payload", body = ErrorSchema),
        (status = 409, description = "Identifier already taken", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["umarell"],
    operation_id = "createUmarell"
)]
#[post("/umarell/{id}")]
pub async fn create_watcher(
    state: web::Data<HttpState>,
    id: web::Path<String>,
    payload: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let watcher = state.registry.create_watcher(&id, &payload).await?;
    Ok(HttpResponse::Created().json(watcher))
}

/// Fetch a construction site.
#[utoipa::path(
    get,
    path = "/api/v1/cantiere/{id}",
    params(("id" = String, Path, description = "Positive integer identifier")),
    responses(
        (status = 200, description = "Construction site", body = ConstructionSiteSchema),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 404, description = "No site under this identifier", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["cantiere"],
    operation_id = "getCantiere"
)]
#[get("/cantiere/{id}")]
pub async fn get_site(
    state: web::Data<HttpState>,
    id: web::Path<String>,
) -> ApiResult<web::Json<ConstructionSite>> {
    let site = state.registry.get_site(&id).await?;
    Ok(web::Json(site))
}

/// Register a construction site and announce it to subscribers.
///
/// Responds only after the broker acknowledged the notification. When the
/// broker fails the site stays stored and the response is 502.
#[utoipa::path(
    post,
    path = "/api/v1/cantiere/{id}",
    params(("id" = String, Path, description = "Positive integer identifier")),
    request_body = ConstructionSiteSchema,
    responses(
        (status = 201, description = "Site created and announced", body = ConstructionSiteSchema),
        (status = 400, description = "Malformed identifier or payload", body = ErrorSchema),
        (status = 409, description = "Identifier already taken", body = ErrorSchema),
        (status = 502, description = "Site stored but notification not published", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["cantiere"],
    operation_id = "createCantiere"
)]
#[post("/cantiere/{id}")]
pub async fn create_site(
    state: web::Data<HttpState>,
    id: web::Path<String>,
    payload: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let site = state.registry.create_site(&id, &payload).await?;
    Ok(HttpResponse::Created().json(site))
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
