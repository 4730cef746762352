//! Task model
//!
//! Table: tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use td_core::time::flexible;
use td_core::RecordId;
use validator::Validate;

use crate::parent::{ParentKind, ParentModel};
use crate::status::{Priority, Status};

/// A task row. Tasks always belong to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: RecordId,
    pub title: String,
    pub status: Status,
    pub priority: Priority,
    #[serde(with = "flexible")]
    pub due_date: DateTime<Utc>,
    pub project_id: RecordId,
    #[serde(default)]
    pub description: Option<String>,
    /// Assigned employee, if any.
    #[serde(default)]
    pub employee_id: Option<RecordId>,
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(with = "flexible")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskDraft {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(with = "flexible")]
    pub due_date: DateTime<Utc>,
    pub project_id: RecordId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub employee_id: Option<RecordId>,
}

impl ParentModel for Task {
    const KIND: ParentKind = ParentKind::Task;
    const HAS_STATUS: bool = true;
    const PROJECT_SCOPED: bool = true;
    type Draft = TaskDraft;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_requires_project() {
        let missing: Result<TaskDraft, _> =
            serde_json::from_str(r#"{"title": "Ship it", "due_date": "2024-06-01"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_draft_parses() {
        let draft: TaskDraft = serde_json::from_str(
            r#"{
                "title": "Ship it",
                "due_date": "2024-06-01T12:00:00Z",
                "project_id": "5f0c1b2a-9d3e-4f6a-8b7c-1d2e3f4a5b6c",
                "priority": "high"
            }"#,
        )
        .unwrap();
        assert!(draft.validate().is_ok());
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.status, Status::NotStarted);
    }
}
