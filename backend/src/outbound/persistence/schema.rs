//! Diesel table definitions for the PostgreSQL schema.
//!
//! Must match `backend/migrations` exactly.

diesel::table! {
    /// Schemaless documents for both record kinds.
    ///
    /// Keyed by `(collection, id)`; `collection` is `umarell` or `cantiere`.
    records (collection, id) {
        collection -> Text,
        id -> Int8,
        /// Record body as stored by the registry (camelCase JSON).
        document -> Jsonb,
    }
}
