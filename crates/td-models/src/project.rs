//! Project model
//!
//! Table: projects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use td_core::time::flexible;
use td_core::RecordId;
use validator::Validate;

use crate::parent::{ParentKind, ParentModel};
use crate::status::{Priority, Status};

/// A project row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "flexible::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "flexible::option")]
    pub end_date: Option<DateTime<Utc>>,
    pub status: Status,
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<String>,
    /// Locator of the current attachment, if any.
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(with = "flexible")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible")]
    pub updated_at: DateTime<Utc>,
}

/// Write model accepted on create and full update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProjectDraft {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "flexible::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "flexible::option")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<String>,
}

impl ParentModel for Project {
    const KIND: ParentKind = ParentKind::Project;
    const HAS_STATUS: bool = true;
    const PROJECT_SCOPED: bool = false;
    type Draft = ProjectDraft;
}
