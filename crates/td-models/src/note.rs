//! Note model
//!
//! Table: notes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use td_core::time::flexible;
use td_core::RecordId;
use validator::Validate;

use crate::parent::{ParentKind, ParentModel};

/// A note row. Notes are authored by an employee and may be scoped to a
/// project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: RecordId,
    pub title: String,
    pub content: String,
    pub employee_id: RecordId,
    #[serde(default)]
    pub project_id: Option<RecordId>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(with = "flexible")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NoteDraft {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    pub employee_id: RecordId,
    #[serde(default)]
    pub project_id: Option<RecordId>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ParentModel for Note {
    const KIND: ParentKind = ParentKind::Note;
    const HAS_STATUS: bool = false;
    const PROJECT_SCOPED: bool = true;
    type Draft = NoteDraft;
}
