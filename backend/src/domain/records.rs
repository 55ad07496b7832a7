//! Registry records: construction sites (cantieri) and their watchers (umarell).
//!
//! Records are immutable once created. Both kinds share the postal-code
//! attribute used by search and by notification filtering; nothing else links
//! them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::PostalCode;

/// Document collection a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Site-watchers, stored under `umarell`.
    Watchers,
    /// Construction sites, stored under `cantiere`.
    Sites,
}

impl Collection {
    /// Both collections, in the order the bulk clear walks them.
    pub const ALL: [Collection; 2] = [Collection::Watchers, Collection::Sites];

    /// Storage name of the collection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Watchers => "umarell",
            Self::Sites => "cantiere",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the document field holding the postal code in both collections.
pub const POSTAL_CODE_FIELD: &str = "postalCode";

/// A registered construction site.
///
/// Serialises as `{"address": "...", "postalCode": 20100}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConstructionSite {
    /// Street address; never blank.
    pub address: String,
    /// Postal code of the site.
    pub postal_code: PostalCode,
}

/// A registered site-watcher.
///
/// Serialises as `{"firstName": "...", "lastName": "...", "postalCode": 20100}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Watcher {
    /// Given name; never blank.
    pub first_name: String,
    /// Family name; never blank.
    pub last_name: String,
    /// Postal code the watcher patrols.
    pub postal_code: PostalCode,
}

impl Watcher {
    /// `"firstName lastName"`, the form listed by search results.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Name of the message attribute carrying the postal code.
pub const CAP_ATTRIBUTE: &str = "cap";

/// Announcement that a construction site was registered.
///
/// The body is the site address; the `cap` attribute carries the postal code
/// as decimal text so subscriptions can filter on it broker-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteNotification {
    body: String,
    postal_code: PostalCode,
}

impl SiteNotification {
    /// Build the notification for a freshly stored site.
    #[must_use]
    pub fn for_site(site: &ConstructionSite) -> Self {
        Self {
            body: site.address.clone(),
            postal_code: site.postal_code,
        }
    }

    /// Message body (the site address).
    #[must_use]
    pub fn body(&self) -> &str {
        self.body.as_str()
    }

    /// Postal code carried by the `cap` attribute.
    #[must_use]
    pub fn postal_code(&self) -> PostalCode {
        self.postal_code
    }

    /// Message attributes as sent to the broker.
    #[must_use]
    pub fn attributes(&self) -> Vec<(String, String)> {
        vec![(CAP_ATTRIBUTE.to_owned(), self.postal_code.to_string())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cap(value: i64) -> PostalCode {
        PostalCode::new(value).expect("valid postal code")
    }

    #[test]
    fn site_uses_camel_case_wire_shape() {
        let site = ConstructionSite {
            address: "Via Roma".into(),
            postal_code: cap(20100),
        };
        assert_eq!(
            serde_json::to_value(&site).expect("serialise site"),
            json!({ "address": "Via Roma", "postalCode": 20100 })
        );
    }

    #[test]
    fn watcher_full_name_joins_with_space() {
        let watcher = Watcher {
            first_name: "Gino".into(),
            last_name: "Bianchi".into(),
            postal_code: cap(40121),
        };
        assert_eq!(watcher.full_name(), "Gino Bianchi");
    }

    #[test]
    fn notification_carries_address_and_cap() {
        let site = ConstructionSite {
            address: "Via Roma".into(),
            postal_code: cap(20100),
        };
        let notification = SiteNotification::for_site(&site);
        assert_eq!(notification.body(), "Via Roma");
        assert_eq!(
            notification.attributes(),
            vec![("cap".to_owned(), "20100".to_owned())]
        );
    }
}
