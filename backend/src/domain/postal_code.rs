//! Italian postal code (CAP) primitive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Smallest accepted postal code.
pub const POSTAL_CODE_MIN: i64 = 10_000;
/// Largest accepted postal code.
pub const POSTAL_CODE_MAX: i64 = 99_999;

/// Validation errors returned by [`PostalCode::new`] and its parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostalCodeValidationError {
    /// Not an integer.
    NotANumber,
    /// Outside 10000..=99999.
    OutOfRange {
        /// The rejected value.
        value: i64,
    },
}

impl fmt::Display for PostalCodeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber => write!(f, "postal code must be an integer"),
            Self::OutOfRange { value } => write!(
                f,
                "postal code {value} must be between {POSTAL_CODE_MIN} and {POSTAL_CODE_MAX}"
            ),
        }
    }
}

impl std::error::Error for PostalCodeValidationError {}

/// Five-digit postal code in `[10000, 99999]`.
///
/// Renders as decimal text, which is also the form carried by the `cap`
/// notification attribute.
///
/// # Examples
/// ```
/// use umarell::domain::PostalCode;
///
/// let cap = PostalCode::new(20100).expect("in range");
/// assert_eq!(cap.to_string(), "20100");
/// assert!(PostalCode::new(9_999).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PostalCode(u32);

impl PostalCode {
    /// Validate the numeric range.
    pub fn new(value: i64) -> Result<Self, PostalCodeValidationError> {
        if !(POSTAL_CODE_MIN..=POSTAL_CODE_MAX).contains(&value) {
            return Err(PostalCodeValidationError::OutOfRange { value });
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| PostalCodeValidationError::OutOfRange { value })
    }

    /// The numeric value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostalCode {
    type Err = PostalCodeValidationError;

    /// Parse decimal text, ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(PostalCodeValidationError::NotANumber);
        }
        let value = trimmed
            .parse::<i64>()
            .map_err(|_| PostalCodeValidationError::NotANumber)?;
        Self::new(value)
    }
}

impl TryFrom<i64> for PostalCode {
    type Error = PostalCodeValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PostalCode> for i64 {
    fn from(value: PostalCode) -> Self {
        i64::from(value.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(10_000)]
    #[case(20_100)]
    #[case(99_999)]
    fn accepts_range_boundaries(#[case] value: i64) {
        let code = PostalCode::new(value).expect("value in range");
        assert_eq!(i64::from(code), value);
    }

    #[rstest]
    #[case(9_999)]
    #[case(100_000)]
    #[case(0)]
    #[case(-20_100)]
    fn rejects_values_outside_range(#[case] value: i64) {
        assert_eq!(
            PostalCode::new(value),
            Err(PostalCodeValidationError::OutOfRange { value })
        );
    }

    #[rstest]
    #[case(" 20100 ", Ok(20_100))]
    #[case("20100", Ok(20_100))]
    #[case("2010O", Err(PostalCodeValidationError::NotANumber))]
    #[case("", Err(PostalCodeValidationError::NotANumber))]
    #[case("-20100", Err(PostalCodeValidationError::NotANumber))]
    #[case("100000", Err(PostalCodeValidationError::OutOfRange { value: 100_000 }))]
    fn parses_decimal_text(
        #[case] raw: &str,
        #[case] expected: Result<u32, PostalCodeValidationError>,
    ) {
        assert_eq!(raw.parse::<PostalCode>().map(PostalCode::get), expected);
    }
}
