//! Postal-code search: an HTML form and its JSON counterpart.
//!
//! ```text
//! GET  /                 empty search form
//! POST /                 form submission, renders the result list
//! GET  /api/v1/search    JSON results
//! ```
//!
//! Toggles follow HTML checkbox semantics: a field that is absent, empty,
//! `false`, `0`, or `off` is unchecked; any other value is checked.

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    POSTAL_CODE_FIELD, POSTAL_CODE_MAX, POSTAL_CODE_MIN, RegistryError, SearchQuery,
    ValidationErrors,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Search input shared by the form and the JSON endpoint.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchForm {
    /// Postal code to match, 10000 to 99999.
    pub postal_code: Option<String>,
    /// Include watcher names.
    pub include_watchers: Option<String>,
    /// Include site addresses.
    pub include_sites: Option<String>,
}

impl SearchForm {
    fn to_query(&self) -> Result<SearchQuery, RegistryError> {
        SearchQuery::from_raw(
            self.postal_code.as_deref(),
            is_checked(self.include_watchers.as_deref()),
            is_checked(self.include_sites.as_deref()),
        )
    }
}

fn is_checked(raw: Option<&str>) -> bool {
    raw.map(|value| value.trim().to_ascii_lowercase())
        .is_some_and(|value| !matches!(value.as_str(), "" | "false" | "0" | "off"))
}

/// JSON search results.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    /// Watcher names, then site addresses.
    pub results: Vec<String>,
}

/// Render the empty search form.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Search form", body = String, content_type = "text/html")),
    tags = ["search"],
    operation_id = "searchPage"
)]
#[get("/")]
pub async fn search_page() -> HttpResponse {
    html(StatusCode::OK, render_page(&SearchForm::default(), &Outcome::Empty))
}

/// Submit the search form.
#[utoipa::path(
    post,
    path = "/",
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Result list", body = String, content_type = "text/html"),
        (status = 400, description = "Validation error", body = String, content_type = "text/html"),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["search"],
    operation_id = "searchSubmit"
)]
#[post("/")]
pub async fn search_submit(
    state: web::Data<HttpState>,
    submitted: web::Form<SearchForm>,
) -> ApiResult<HttpResponse> {
    let form = submitted.into_inner();
    let query = match form.to_query() {
        Ok(query) => query,
        Err(RegistryError::ValidationFailed { errors, .. }) => {
            return Ok(html(
                StatusCode::BAD_REQUEST,
                render_page(&form, &Outcome::Invalid(&errors)),
            ));
        }
        Err(other) => return Err(other.into()),
    };
    let results = state.search.search(&query).await?;
    Ok(html(StatusCode::OK, render_page(&form, &Outcome::Results(&results))))
}

/// Search both collections by postal code.
#[utoipa::path(
    get,
    path = "/api/v1/search",
    params(SearchForm),
    responses(
        (status = 200, description = "Matching records", body = SearchResponse),
        (status = 400, description = "Invalid postal code", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["search"],
    operation_id = "searchRecords"
)]
#[get("/search")]
pub async fn search_records(
    state: web::Data<HttpState>,
    form: web::Query<SearchForm>,
) -> ApiResult<web::Json<SearchResponse>> {
    let query = form.to_query()?;
    let results = state.search.search(&query).await?;
    Ok(web::Json(SearchResponse { results }))
}

enum Outcome<'a> {
    Empty,
    Results(&'a [String]),
    Invalid(&'a ValidationErrors),
}

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn checkbox(name: &str, label: &str, raw: Option<&str>) -> String {
    let checked = if is_checked(raw) { " checked" } else { "" };
    format!(r#"<label><input type="checkbox" name="{name}" value="y"{checked}> {label}</label>"#)
}

fn render_page(form: &SearchForm, outcome: &Outcome<'_>) -> String {
    let postal_code = escape_html(form.postal_code.as_deref().unwrap_or_default());
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Umarell</title></head>\n<body>\n",
    );
    page.push_str(&format!(
        "<form method=\"post\" action=\"/\">\
         <input type=\"number\" name=\"{POSTAL_CODE_FIELD}\" min=\"{POSTAL_CODE_MIN}\" \
         max=\"{POSTAL_CODE_MAX}\" value=\"{postal_code}\" required> {} {} \
         <button type=\"submit\">Search</button></form>\n",
        checkbox("includeWatchers", "umarell", form.include_watchers.as_deref()),
        checkbox("includeSites", "cantieri", form.include_sites.as_deref()),
    ));

    match outcome {
        Outcome::Empty => {}
        Outcome::Results(results) => {
            page.push_str("<ul>\n");
            for result in *results {
                page.push_str(&format!("<li>{}</li>\n", escape_html(result)));
            }
            page.push_str("</ul>\n");
        }
        Outcome::Invalid(errors) => {
            page.push_str("<p>Validation error</p>\n<ul class=\"errors\">\n");
            for error in errors.errors() {
                page.push_str(&format!(
                    "<li>{}: {}</li>\n",
                    escape_html(&error.field),
                    escape_html(&error.reason)
                ));
            }
            page.push_str("</ul>\n");
        }
    }
    page.push_str("</body>\n</html>\n");
    page
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
