//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay framework-agnostic by not deriving `ToSchema`. The
//! wrappers below mirror their structure and live in the inbound adapter,
//! where framework concerns belong.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The requested record does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// A record already exists under the identifier.
    #[schema(rename = "conflict")]
    Conflict,
    /// The record store is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// The message broker did not accept the notification.
    #[schema(rename = "bad_gateway")]
    BadGateway,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "not_found")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "umarell 4 not found")]
    message: String,
    /// Correlation identifier, echoed in the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Field errors or the offending identifier.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::Watcher`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Watcher)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct WatcherSchema {
    #[schema(example = "Gino")]
    first_name: String,
    #[schema(example = "Bianchi")]
    last_name: String,
    /// Postal code, 10000 to 99999.
    #[schema(minimum = 10000, maximum = 99999, example = 40121)]
    postal_code: u32,
}

/// OpenAPI schema for [`crate::domain::ConstructionSite`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ConstructionSite)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ConstructionSiteSchema {
    #[schema(example = "Via Roma 1")]
    address: String,
    /// Postal code, 10000 to 99999.
    #[schema(minimum = 10000, maximum = 99999, example = 20100)]
    postal_code: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::PartialSchema;

    fn schema_json<T: PartialSchema>() -> serde_json::Value {
        serde_json::to_value(T::schema()).expect("schema serialises")
    }

    #[test]
    fn error_codes_use_snake_case() {
        let schema = schema_json::<ErrorCodeSchema>();
        let values = schema
            .get("enum")
            .and_then(serde_json::Value::as_array)
            .expect("enum values");
        assert!(values.contains(&serde_json::json!("bad_gateway")));
        assert!(values.contains(&serde_json::json!("service_unavailable")));
    }

    #[test]
    fn record_schemas_use_camel_case_fields() {
        let watcher = schema_json::<WatcherSchema>();
        assert!(watcher.pointer("/properties/firstName").is_some());
        assert!(watcher.pointer("/properties/postalCode").is_some());

        let site = schema_json::<ConstructionSiteSchema>();
        assert!(site.pointer("/properties/address").is_some());
        assert!(site.pointer("/properties/postalCode").is_some());
    }
}
