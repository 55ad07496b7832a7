//! Schema validation for incoming record payloads.
//!
//! Validators inspect raw JSON rather than relying on serde failures so that
//! every problem in a payload is reported at once, keyed by field name.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{ConstructionSite, POSTAL_CODE_FIELD, PostalCode, PostalCodeValidationError, Watcher};

/// Pseudo-field used when the payload as a whole is unusable.
pub const SCHEMA_FIELD: &str = "_schema";

/// One schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Offending field, or [`SCHEMA_FIELD`] for whole-payload problems.
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

/// Ordered list of schema violations; never empty when returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Individual field errors in detection order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether `field` has at least one recorded error.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|error| format!("{}: {}", error.field, error.reason))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&rendered)
    }
}

impl std::error::Error for ValidationErrors {}

const SITE_FIELDS: [&str; 2] = ["address", POSTAL_CODE_FIELD];
const WATCHER_FIELDS: [&str; 3] = ["firstName", "lastName", POSTAL_CODE_FIELD];

/// Validate a construction-site payload.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use umarell::domain::validate_site;
///
/// let site = validate_site(&json!({ "address": "Via Roma", "postalCode": 20100 }))
///     .expect("valid payload");
/// assert_eq!(site.address, "Via Roma");
///
/// let errors = validate_site(&json!({ "postalCode": 9999 })).expect_err("invalid");
/// assert!(errors.has_field("address"));
/// assert!(errors.has_field("postalCode"));
/// ```
pub fn validate_site(payload: &Value) -> Result<ConstructionSite, ValidationErrors> {
    let mut reader = ObjectReader::new(payload)?;
    let address = reader.required_text("address");
    let postal_code = reader.required_postal_code(POSTAL_CODE_FIELD);
    reader.reject_unknown(&SITE_FIELDS);

    match (address, postal_code, reader.finish()) {
        (Some(address), Some(postal_code), Ok(())) => Ok(ConstructionSite {
            address,
            postal_code,
        }),
        (_, _, Err(errors)) => Err(errors),
        _ => Err(ValidationErrors(vec![schema_error("payload is incomplete")])),
    }
}

/// Validate a watcher payload.
pub fn validate_watcher(payload: &Value) -> Result<Watcher, ValidationErrors> {
    let mut reader = ObjectReader::new(payload)?;
    let first_name = reader.required_text("firstName");
    let last_name = reader.required_text("lastName");
    let postal_code = reader.required_postal_code(POSTAL_CODE_FIELD);
    reader.reject_unknown(&WATCHER_FIELDS);

    match (first_name, last_name, postal_code, reader.finish()) {
        (Some(first_name), Some(last_name), Some(postal_code), Ok(())) => Ok(Watcher {
            first_name,
            last_name,
            postal_code,
        }),
        (_, _, _, Err(errors)) => Err(errors),
        _ => Err(ValidationErrors(vec![schema_error("payload is incomplete")])),
    }
}

/// Validate a postal code supplied as a single value (e.g. a search field).
pub fn validate_postal_code(
    field: &str,
    raw: Option<&str>,
) -> Result<PostalCode, ValidationErrors> {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return Err(ValidationErrors(vec![field_error(
            field,
            "missing required field",
        )]));
    };
    raw.parse::<PostalCode>()
        .map_err(|err| ValidationErrors(vec![postal_code_error(field, &err)]))
}

fn field_error(field: &str, reason: impl Into<String>) -> FieldError {
    FieldError {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

fn schema_error(reason: &str) -> FieldError {
    field_error(SCHEMA_FIELD, reason)
}

fn postal_code_error(field: &str, err: &PostalCodeValidationError) -> FieldError {
    field_error(field, err.to_string())
}

struct ObjectReader<'a> {
    object: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> ObjectReader<'a> {
    fn new(payload: &'a Value) -> Result<Self, ValidationErrors> {
        match payload {
            Value::Object(object) => Ok(Self {
                object,
                errors: Vec::new(),
            }),
            _ => Err(ValidationErrors(vec![schema_error(
                "payload must be a JSON object",
            )])),
        }
    }

    fn required(&mut self, field: &str) -> Option<&'a Value> {
        match self.object.get(field) {
            None | Some(Value::Null) => {
                self.errors
                    .push(field_error(field, "missing required field"));
                None
            }
            Some(value) => Some(value),
        }
    }

    fn required_text(&mut self, field: &str) -> Option<String> {
        match self.required(field)? {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            _ => {
                self.errors
                    .push(field_error(field, "must be a non-empty string"));
                None
            }
        }
    }

    fn required_postal_code(&mut self, field: &str) -> Option<PostalCode> {
        let parsed = match self.required(field)? {
            Value::Number(number) => number
                .as_i64()
                .ok_or(PostalCodeValidationError::NotANumber)
                .and_then(PostalCode::new),
            Value::String(text) => text.parse::<PostalCode>(),
            _ => Err(PostalCodeValidationError::NotANumber),
        };
        parsed
            .map_err(|err| self.errors.push(postal_code_error(field, &err)))
            .ok()
    }

    fn reject_unknown(&mut self, allowed: &[&str]) {
        for key in self.object.keys() {
            if !allowed.contains(&key.as_str()) {
                self.errors.push(field_error(key, "unknown field"));
            }
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}
