//! PostgreSQL persistence adapter using Diesel ORM.
//!
//! Provides the [`RecordStore`](crate::domain::ports::RecordStore)
//! implementation backed by PostgreSQL via `diesel-async` and `bb8`
//! connection pooling.
//!
//! - **Thin adapter**: the store only translates between rows and JSON
//!   documents. Create-only rules live in the registry service.
//! - **Internal models**: row structs (`models.rs`) and the table definition
//!   (`schema.rs`) are never exposed to the domain layer.
//!
//! # Example
//!
//! ```ignore
//! use umarell::outbound::persistence::{DbPool, DieselRecordStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/umarell")).await?;
//! let store = DieselRecordStore::new(pool);
//! ```

mod diesel_record_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_record_store::DieselRecordStore;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
