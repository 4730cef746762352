//! Reminder model
//!
//! Table: reminders

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use td_core::time::flexible;
use td_core::RecordId;
use validator::Validate;

use crate::parent::{ParentKind, ParentModel};
use crate::status::{Priority, Status};

/// A reminder row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: RecordId,
    pub title: String,
    #[serde(with = "flexible")]
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub project_id: Option<RecordId>,
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(with = "flexible")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReminderDraft {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(with = "flexible")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub project_id: Option<RecordId>,
}

impl ParentModel for Reminder {
    const KIND: ParentKind = ParentKind::Reminder;
    const HAS_STATUS: bool = true;
    const PROJECT_SCOPED: bool = true;
    type Draft = ReminderDraft;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let draft: ReminderDraft =
            serde_json::from_str(r#"{"title": "Renew certs", "due_date": "2024-07-01"}"#).unwrap();
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.status, Status::NotStarted);
        assert!(draft.project_id.is_none());
    }
}
