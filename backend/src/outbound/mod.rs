//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed record store using Diesel ORM
//! - **pubsub**: Pub/Sub REST client for publishing and subscriptions
//! - **memory**: in-process store and broker for local runs and tests
//!
//! Adapters are thin translators between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod memory;
pub mod persistence;
pub mod pubsub;
