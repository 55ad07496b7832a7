//! Postal-code search across watchers and construction sites.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::ports::{RecordSearch, RecordStore};
use super::{
    Collection, ConstructionSite, POSTAL_CODE_FIELD, PostalCode, RegistryError, Watcher,
    validate_postal_code,
};

/// Validated search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchQuery {
    /// Postal code both record kinds are matched against.
    pub postal_code: PostalCode,
    /// Include watcher names in the results.
    pub include_watchers: bool,
    /// Include site addresses in the results.
    pub include_sites: bool,
}

impl SearchQuery {
    /// Build a query from raw form input.
    ///
    /// # Examples
    /// ```
    /// use umarell::domain::SearchQuery;
    ///
    /// let query = SearchQuery::from_raw(Some("20100"), false, true).expect("valid");
    /// assert_eq!(query.postal_code.get(), 20100);
    /// assert!(SearchQuery::from_raw(Some("9999"), true, true).is_err());
    /// ```
    pub fn from_raw(
        postal_code: Option<&str>,
        include_watchers: bool,
        include_sites: bool,
    ) -> Result<Self, RegistryError> {
        let postal_code = validate_postal_code(POSTAL_CODE_FIELD, postal_code).map_err(
            |errors| RegistryError::ValidationFailed {
                subject: "search",
                errors,
            },
        )?;
        Ok(Self {
            postal_code,
            include_watchers,
            include_sites,
        })
    }
}

/// Search service implementing [`RecordSearch`] over a [`RecordStore`].
pub struct SearchService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for SearchService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecordStore + ?Sized> SearchService<S> {
    /// Create a service over an injected store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn collect<T, F>(
        &self,
        collection: Collection,
        postal_code: PostalCode,
        render: F,
        out: &mut Vec<String>,
    ) -> Result<(), RegistryError>
    where
        T: DeserializeOwned,
        F: Fn(T) -> String,
    {
        let mut matches = self
            .store
            .query(
                collection,
                POSTAL_CODE_FIELD,
                Value::from(i64::from(postal_code)),
            )
            .await?;
        while let Some(stored) = matches.try_next().await? {
            match serde_json::from_value::<T>(stored.document) {
                Ok(record) => out.push(render(record)),
                Err(err) => {
                    warn!(%collection, id = %stored.id, error = %err, "skipping malformed record");
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordSearch for SearchService<S> {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<String>, RegistryError> {
        let mut results = Vec::new();
        if query.include_watchers {
            self.collect(
                Collection::Watchers,
                query.postal_code,
                |watcher: Watcher| watcher.full_name(),
                &mut results,
            )
            .await?;
        }
        if query.include_sites {
            self.collect(
                Collection::Sites,
                query.postal_code,
                |site: ConstructionSite| site.address,
                &mut results,
            )
            .await?;
        }
        debug!(cap = %query.postal_code, matches = results.len(), "search completed");
        Ok(results)
    }
}
