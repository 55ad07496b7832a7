//! Internal Diesel row structs for database operations.

use diesel::prelude::*;
use serde_json::Value;

use super::schema::records;

/// Row read from the `records` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecordRow {
    pub id: i64,
    pub document: Value,
}

/// Insertable row for the `records` table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = records)]
pub(crate) struct NewRecordRow<'a> {
    pub collection: &'a str,
    pub id: i64,
    pub document: &'a Value,
}
