//! Record store contract
//!
//! Mirrors the upstream table service API: `insert`, `update`, `select`,
//! `delete` over JSON rows. The store never generates IDs; callers put a
//! string `id` field on every row before inserting.

use async_trait::async_trait;
use serde_json::Value;
use td_core::RecordId;
use td_models::ParentKind;
use thiserror::Error;

/// Tables known to the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Projects,
    Tasks,
    Notes,
    Events,
    Reminders,
    Employees,
    Files,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Tasks => "tasks",
            Self::Notes => "notes",
            Self::Events => "events",
            Self::Reminders => "reminders",
            Self::Employees => "employees",
            Self::Files => "files",
        }
    }
}

impl From<ParentKind> for Table {
    fn from(kind: ParentKind) -> Self {
        match kind {
            ParentKind::Project => Self::Projects,
            ParentKind::Task => Self::Tasks,
            ParentKind::Note => Self::Notes,
            ParentKind::Event => Self::Events,
            ParentKind::Reminder => Self::Reminders,
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operations in the store contract, named in write-failure errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Insert,
    Update,
    Select,
    Delete,
}

impl StoreOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Select => "select",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for StoreOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no row in {table} with id {id}")]
    RowNotFound { table: Table, id: RecordId },

    #[error("{op} on {table} rejected: {message}")]
    Write {
        table: Table,
        op: StoreOp,
        message: String,
    },

    #[error("malformed row for {table}: {message}")]
    MalformedRow { table: Table, message: String },

    #[error("record store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Row filter for `select`.
#[derive(Debug, Clone)]
pub enum Filter {
    All,
    ById(RecordId),
    /// Field equality, e.g. `Eq("project_id", json!("..."))`.
    Eq(&'static str, Value),
}

impl Filter {
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::ById(id) => row
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|v| v == id.to_string()),
            Filter::Eq(field, expected) => row.get(*field).is_some_and(|v| v == expected),
        }
    }
}

/// Record store contract.
///
/// Each call commits independently; a failed call leaves every other table
/// untouched. Compensating actions, not transactions, keep tables
/// consistent.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a row (an object carrying a string `id`). Returns the stored
    /// row.
    async fn insert(&self, table: Table, row: Value) -> StoreResult<Value>;

    /// Merge `patch` into the row with the given ID. Returns the updated
    /// row.
    async fn update(&self, table: Table, id: RecordId, patch: Value) -> StoreResult<Value>;

    /// Fetch rows matching the filter, in insertion order.
    async fn select(&self, table: Table, filter: Filter) -> StoreResult<Vec<Value>>;

    /// Delete the row with the given ID. `RowNotFound` if absent.
    async fn delete(&self, table: Table, id: RecordId) -> StoreResult<()>;

    /// Fetch a single row by ID.
    async fn find_by_id(&self, table: Table, id: RecordId) -> StoreResult<Option<Value>> {
        let mut rows = self.select(table, Filter::ById(id)).await?;
        Ok(rows.pop())
    }
}
