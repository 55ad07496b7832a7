//! In-process adapters used when no database or broker is configured, and by
//! integration tests.

mod broker;
mod record_store;

pub use broker::{DEFAULT_ACK_DEADLINE, DEFAULT_PULL_WAIT, InMemoryBroker};
pub use record_store::InMemoryRecordStore;
