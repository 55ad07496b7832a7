//! Broker-side subscription filters.
//!
//! Filters are built as a small expression tree and only rendered to the
//! broker's textual syntax at the boundary. Values are always quoted and
//! escaped when rendered, so no input can change the shape of the
//! expression. The same tree can be evaluated locally against message
//! attributes, which is how the in-memory broker honours subscriptions.
//!
//! Rendered syntax (Pub/Sub filter language):
//!
//! ```text
//! attributes:cap
//! attributes:cap AND (attributes.cap = "20100" OR attributes.cap = "20200")
//! ```

use std::collections::BTreeMap;
use std::fmt;

use super::{CAP_ATTRIBUTE, PostalCode};

/// Predicate over message attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    /// The attribute is present, whatever its value.
    HasAttribute(String),
    /// The attribute is present and equal to the value.
    Equals { attribute: String, value: String },
    /// Every operand holds.
    All(Vec<FilterExpr>),
    /// At least one operand holds.
    Any(Vec<FilterExpr>),
}

impl FilterExpr {
    /// Presence check for `attribute`.
    pub fn has(attribute: impl Into<String>) -> Self {
        Self::HasAttribute(attribute.into())
    }

    /// Equality check for `attribute`.
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Evaluate against a message's attributes.
    #[must_use]
    pub fn matches(&self, attributes: &BTreeMap<String, String>) -> bool {
        match self {
            Self::HasAttribute(attribute) => attributes.contains_key(attribute),
            Self::Equals { attribute, value } => attributes.get(attribute) == Some(value),
            Self::All(operands) => operands.iter().all(|expr| expr.matches(attributes)),
            Self::Any(operands) => operands.iter().any(|expr| expr.matches(attributes)),
        }
    }

    fn render_into(&self, out: &mut String, nested: bool) {
        match self {
            Self::HasAttribute(attribute) => {
                out.push_str("attributes:");
                out.push_str(attribute);
            }
            Self::Equals { attribute, value } => {
                out.push_str("attributes.");
                out.push_str(attribute);
                out.push_str(" = \"");
                out.push_str(&escape_quoted(value));
                out.push('"');
            }
            Self::All(operands) => render_joined(out, operands, " AND ", nested),
            Self::Any(operands) => render_joined(out, operands, " OR ", nested),
        }
    }
}

fn render_joined(out: &mut String, operands: &[FilterExpr], separator: &str, nested: bool) {
    if nested {
        out.push('(');
    }
    for (index, operand) in operands.iter().enumerate() {
        if index > 0 {
            out.push_str(separator);
        }
        operand.render_into(out, true);
    }
    if nested {
        out.push(')');
    }
}

fn escape_quoted(raw: &str) -> String {
    raw.replace('\\', r"\\").replace('"', "\\\"")
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = String::new();
        self.render_into(&mut rendered, false);
        f.write_str(&rendered)
    }
}

/// Postal-code allow-list requested by a subscriber.
///
/// An empty list means "every site notification"; the `cap` attribute must
/// still be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostalCodeFilter {
    postal_codes: Vec<PostalCode>,
}

impl PostalCodeFilter {
    /// Accept every notification carrying a `cap` attribute.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Accept only the listed postal codes. Duplicates are dropped, first
    /// occurrence wins.
    #[must_use]
    pub fn only(postal_codes: impl IntoIterator<Item = PostalCode>) -> Self {
        let mut unique: Vec<PostalCode> = Vec::new();
        for code in postal_codes {
            if !unique.contains(&code) {
                unique.push(code);
            }
        }
        Self {
            postal_codes: unique,
        }
    }

    /// Codes in the allow-list, empty when unfiltered.
    #[must_use]
    pub fn postal_codes(&self) -> &[PostalCode] {
        &self.postal_codes
    }

    /// Build the broker filter expression.
    ///
    /// # Examples
    /// ```
    /// use umarell::domain::{PostalCode, PostalCodeFilter};
    ///
    /// let filter = PostalCodeFilter::only([
    ///     PostalCode::new(20100).expect("valid"),
    ///     PostalCode::new(20200).expect("valid"),
    /// ]);
    /// assert_eq!(
    ///     filter.to_expr().to_string(),
    ///     r#"attributes:cap AND (attributes.cap = "20100" OR attributes.cap = "20200")"#
    /// );
    /// assert_eq!(PostalCodeFilter::any().to_expr().to_string(), "attributes:cap");
    /// ```
    #[must_use]
    pub fn to_expr(&self) -> FilterExpr {
        let presence = FilterExpr::has(CAP_ATTRIBUTE);
        if self.postal_codes.is_empty() {
            return presence;
        }
        let alternatives = self
            .postal_codes
            .iter()
            .map(|code| FilterExpr::equals(CAP_ATTRIBUTE, code.to_string()))
            .collect();
        FilterExpr::All(vec![presence, FilterExpr::Any(alternatives)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn codes(values: &[i64]) -> Vec<PostalCode> {
        values
            .iter()
            .map(|value| PostalCode::new(*value).expect("valid postal code"))
            .collect()
    }

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn single_code_keeps_parenthesised_disjunction() {
        let filter = PostalCodeFilter::only(codes(&[20100]));
        assert_eq!(
            filter.to_expr().to_string(),
            r#"attributes:cap AND (attributes.cap = "20100")"#
        );
    }

    #[test]
    fn duplicate_codes_render_once() {
        let filter = PostalCodeFilter::only(codes(&[20100, 20200, 20100]));
        assert_eq!(filter.postal_codes(), codes(&[20100, 20200]).as_slice());
    }

    #[test]
    fn rendering_escapes_quotes_and_backslashes() {
        let expr = FilterExpr::equals("cap", r#"1" OR attributes:x \"#);
        assert_eq!(
            expr.to_string(),
            r#"attributes.cap = "1\" OR attributes:x \\""#
        );
    }

    #[rstest]
    #[case(&[("cap", "20100")], true)]
    #[case(&[("cap", "20200")], true)]
    #[case(&[("cap", "30100")], false)]
    #[case(&[], false)]
    #[case(&[("zip", "20100")], false)]
    fn allow_list_matches_only_listed_codes(
        #[case] pairs: &[(&str, &str)],
        #[case] expected: bool,
    ) {
        let expr = PostalCodeFilter::only(codes(&[20100, 20200])).to_expr();
        assert_eq!(expr.matches(&attrs(pairs)), expected);
    }

    #[rstest]
    #[case(&[("cap", "20100")], true)]
    #[case(&[("cap", "")], true)]
    #[case(&[("other", "x")], false)]
    fn unfiltered_requires_cap_presence(#[case] pairs: &[(&str, &str)], #[case] expected: bool) {
        assert_eq!(
            PostalCodeFilter::any().to_expr().matches(&attrs(pairs)),
            expected
        );
    }
}
