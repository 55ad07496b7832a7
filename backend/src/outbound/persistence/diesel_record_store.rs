//! PostgreSQL-backed `RecordStore` implementation using Diesel ORM.
//!
//! Both collections share the `records` table; the collection name is part of
//! the primary key. Field queries compare the top-level JSON member with
//! `document -> field = value`, so a JSON number only matches a JSON number.

use async_trait::async_trait;
use diesel::dsl::{exists, sql};
use diesel::prelude::*;
use diesel::sql_types::{Bool, Jsonb, Text};
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use futures_util::StreamExt;
use futures_util::stream;
use serde_json::Value;
use tracing::debug;

use crate::domain::ports::{RecordStore, RecordStoreError, RecordStream, StoredDocument};
use crate::domain::{Collection, RecordId};

use super::models::{NewRecordRow, RecordRow};
use super::pool::{DbPool, PoolError};
use super::schema::records;

/// Diesel-backed implementation of the [`RecordStore`] port.
#[derive(Clone)]
pub struct DieselRecordStore {
    pool: DbPool,
}

impl DieselRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RecordStoreError {
    RecordStoreError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> RecordStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            RecordStoreError::connection("database connection error")
        }
        DieselError::DeserializationError(_) => {
            RecordStoreError::query("stored document could not be decoded")
        }
        _ => RecordStoreError::query("database error"),
    }
}

fn row_to_document(row: RecordRow) -> Result<StoredDocument, RecordStoreError> {
    let id = RecordId::new(row.id)
        .map_err(|err| RecordStoreError::query(format!("stored id {} is invalid: {err}", row.id)))?;
    Ok(StoredDocument {
        id,
        document: row.document,
    })
}

#[async_trait]
impl RecordStore for DieselRecordStore {
    async fn get(
        &self,
        collection: Collection,
        id: RecordId,
    ) -> Result<Option<Value>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        records::table
            .filter(records::collection.eq(collection.as_str()))
            .filter(records::id.eq(id.get()))
            .select(records::document)
            .first::<Value>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }

    async fn exists(&self, collection: Collection, id: RecordId) -> Result<bool, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            records::table
                .filter(records::collection.eq(collection.as_str()))
                .filter(records::id.eq(id.get())),
        ))
        .get_result::<bool>(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn set(
        &self,
        collection: Collection,
        id: RecordId,
        document: Value,
    ) -> Result<(), RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewRecordRow {
            collection: collection.as_str(),
            id: id.get(),
            document: &document,
        };
        diesel::insert_into(records::table)
            .values(&row)
            .on_conflict((records::collection, records::id))
            .do_update()
            .set(records::document.eq(excluded(records::document)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn insert_new(
        &self,
        collection: Collection,
        id: RecordId,
        document: Value,
    ) -> Result<bool, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewRecordRow {
            collection: collection.as_str(),
            id: id.get(),
            document: &document,
        };
        diesel::insert_into(records::table)
            .values(&row)
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map(|inserted| inserted == 1)
            .map_err(map_diesel_error)
    }

    async fn list_ids(&self, collection: Collection) -> Result<Vec<RecordId>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids: Vec<i64> = records::table
            .filter(records::collection.eq(collection.as_str()))
            .select(records::id)
            .order(records::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        ids.into_iter()
            .map(|raw| {
                RecordId::new(raw).map_err(|err| {
                    RecordStoreError::query(format!("stored id {raw} is invalid: {err}"))
                })
            })
            .collect()
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<(), RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(
            records::table
                .filter(records::collection.eq(collection.as_str()))
                .filter(records::id.eq(id.get())),
        )
        .execute(&mut conn)
        .await
        .map(|_| ())
        .map_err(map_diesel_error)
    }

    async fn query(
        &self,
        collection: Collection,
        field: &str,
        value: Value,
    ) -> Result<RecordStream, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let field_matches = sql::<Bool>("document -> ")
            .bind::<Text, _>(field.to_owned())
            .sql(" = ")
            .bind::<Jsonb, _>(value);
        let rows: Vec<RecordRow> = records::table
            .filter(records::collection.eq(collection.as_str()))
            .filter(field_matches)
            .order(records::id.asc())
            .select(RecordRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        debug!(%collection, field, matches = rows.len(), "record query executed");
        Ok(stream::iter(rows.into_iter().map(row_to_document)).boxed())
    }
}
