//! Externally supplied record identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`RecordId::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordIdValidationError {
    /// The identifier was blank.
    Empty,
    /// Not a canonical positive decimal integer.
    NotPositiveInteger,
    /// Too large for a 64-bit signed integer.
    OutOfRange,
}

impl fmt::Display for RecordIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "record id must not be empty"),
            Self::NotPositiveInteger => write!(f, "record id must be a positive integer"),
            Self::OutOfRange => write!(f, "record id is too large"),
        }
    }
}

impl std::error::Error for RecordIdValidationError {}

/// Positive integer identifier, unique within one collection.
///
/// Only the canonical decimal form is accepted: no sign, no leading zeros, no
/// surrounding whitespace.
///
/// # Examples
/// ```
/// use umarell::domain::RecordId;
///
/// assert_eq!(RecordId::parse("42").map(RecordId::get), Ok(42));
/// assert!(RecordId::parse("042").is_err());
/// assert!(RecordId::parse("0").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RecordId(i64);

impl RecordId {
    /// Parse a path segment into an identifier.
    pub fn parse(raw: &str) -> Result<Self, RecordIdValidationError> {
        let mut chars = raw.chars();
        let Some(first) = chars.next() else {
            return Err(RecordIdValidationError::Empty);
        };
        if !matches!(first, '1'..='9') || !chars.all(|c| c.is_ascii_digit()) {
            return Err(RecordIdValidationError::NotPositiveInteger);
        }
        raw.parse::<i64>()
            .map(Self)
            .map_err(|_| RecordIdValidationError::OutOfRange)
    }

    /// Construct from an already numeric value.
    pub fn new(value: i64) -> Result<Self, RecordIdValidationError> {
        if value < 1 {
            return Err(RecordIdValidationError::NotPositiveInteger);
        }
        Ok(Self(value))
    }

    /// The numeric value.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for RecordId {
    type Error = RecordIdValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for i64 {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", 1)]
    #[case("20100", 20100)]
    #[case("9223372036854775807", i64::MAX)]
    fn accepts_canonical_positive_integers(#[case] raw: &str, #[case] expected: i64) {
        assert_eq!(RecordId::parse(raw).map(RecordId::get), Ok(expected));
    }

    #[rstest]
    #[case("", RecordIdValidationError::Empty)]
    #[case("0", RecordIdValidationError::NotPositiveInteger)]
    #[case("-3", RecordIdValidationError::NotPositiveInteger)]
    #[case("+3", RecordIdValidationError::NotPositiveInteger)]
    #[case("007", RecordIdValidationError::NotPositiveInteger)]
    #[case(" 7", RecordIdValidationError::NotPositiveInteger)]
    #[case("7a", RecordIdValidationError::NotPositiveInteger)]
    #[case("1.5", RecordIdValidationError::NotPositiveInteger)]
    #[case("abc", RecordIdValidationError::NotPositiveInteger)]
    #[case("9223372036854775808", RecordIdValidationError::OutOfRange)]
    fn rejects_malformed_ids(#[case] raw: &str, #[case] expected: RecordIdValidationError) {
        assert_eq!(RecordId::parse(raw), Err(expected));
    }

    #[test]
    fn deserialising_rejects_non_positive_values() {
        assert!(serde_json::from_str::<RecordId>("0").is_err());
        assert_eq!(
            serde_json::from_str::<RecordId>("12").map(RecordId::get).ok(),
            Some(12)
        );
    }
}
