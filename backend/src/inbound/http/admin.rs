//! Maintenance endpoint.
//!
//! ```text
//! GET /api/v1/clean
//! ```

use actix_web::{HttpResponse, get, web};

use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Delete every watcher and construction site. Safe to repeat.
#[utoipa::path(
    get,
    path = "/api/v1/clean",
    responses(
        (status = 200, description = "Both collections are empty"),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "clean"
)]
#[get("/clean")]
pub async fn clean(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    state.registry.clear_all().await?;
    Ok(HttpResponse::Ok().finish())
}
