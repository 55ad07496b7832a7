//! Domain primitives, use-cases, and ports.
//!
//! Purpose: define the registry's record types and the services that create,
//! read, search, and announce them. Adapters live in `inbound` and `outbound`
//! and reach the domain only through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic error payload.
//! - RecordId, PostalCode, Collection: validated identifiers and keys.
//! - ConstructionSite, Watcher, SiteNotification: records and the message
//!   announcing a new site.
//! - RegistryService, SearchService, SubscriptionManager: use-cases.

pub mod error;
pub mod filter;
pub mod ports;
pub mod postal_code;
pub mod record_id;
pub mod records;
pub mod registry_error;
pub mod registry_service;
pub mod search_service;
pub mod subscription_manager;
pub mod trace_id;
pub mod validation;

pub use self::error::{Error, ErrorCode};
pub use self::filter::{FilterExpr, PostalCodeFilter};
pub use self::postal_code::{POSTAL_CODE_MAX, POSTAL_CODE_MIN, PostalCode, PostalCodeValidationError};
pub use self::record_id::{RecordId, RecordIdValidationError};
pub use self::records::{
    CAP_ATTRIBUTE, Collection, ConstructionSite, POSTAL_CODE_FIELD, SiteNotification, Watcher,
};
pub use self::registry_error::RegistryError;
pub use self::registry_service::RegistryService;
pub use self::search_service::{SearchQuery, SearchService};
pub use self::subscription_manager::{
    DEFAULT_MAX_MESSAGES, DEFAULT_SETTLE_DELAY, DEFAULT_SUBSCRIPTION, DEFAULT_TOPIC,
    DeliveredSite, SubscriberError, SubscriberState, SubscriptionManager, SubscriptionSettings,
    parse_postal_code_list,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::validation::{
    FieldError, SCHEMA_FIELD, ValidationErrors, validate_postal_code, validate_site,
    validate_watcher,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use umarell::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::not_found("umarell 4 not found"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
