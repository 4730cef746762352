//! # td-store
//!
//! Record store contract and backends for TaskDesk.
//!
//! The record store is an external table-oriented service: rows are JSON
//! documents keyed by a client-generated ID, each table call commits
//! independently, and there are no cross-table transactions. Everything
//! above this crate is written against the [`RecordStore`] trait.
//!
//! Ships an in-memory backend plus a fault-injecting wrapper used to
//! exercise partial-failure paths in tests.

pub mod fault;
pub mod memory;
pub mod store;

pub use fault::FlakyRecordStore;
pub use memory::MemoryRecordStore;
pub use store::{Filter, RecordStore, StoreError, StoreOp, StoreResult, Table};
