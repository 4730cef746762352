//! Attachment-capable parent entities
//!
//! Five entity kinds may own an attachment. Employees and file rows are
//! stored entities too, but they never appear as attachment parents.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use td_core::RecordId;
use validator::Validate;

/// Entity kinds that can own an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentKind {
    Project,
    Task,
    Note,
    Event,
    Reminder,
}

impl ParentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
            Self::Note => "note",
            Self::Event => "event",
            Self::Reminder => "reminder",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "project" => Some(Self::Project),
            "task" => Some(Self::Task),
            "note" => Some(Self::Note),
            "event" => Some(Self::Event),
            "reminder" => Some(Self::Reminder),
            _ => None,
        }
    }

    /// Name of the record-store table holding this kind.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Task => "tasks",
            Self::Note => "notes",
            Self::Event => "events",
            Self::Reminder => "reminders",
        }
    }
}

impl std::fmt::Display for ParentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to one parent row: kind plus row ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentRef {
    pub kind: ParentKind,
    pub id: RecordId,
}

impl ParentRef {
    pub fn new(kind: ParentKind, id: RecordId) -> Self {
        Self { kind, id }
    }
}

impl std::fmt::Display for ParentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Compile-time description of a parent entity, wiring a full row model to
/// its write model. The REST layer is generic over this.
pub trait ParentModel: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: ParentKind;

    /// Whether the entity exposes a status-only update route.
    const HAS_STATUS: bool;

    /// Whether list requests accept a `?project_id=` filter.
    const PROJECT_SCOPED: bool;

    /// Write model accepted on create/update.
    type Draft: Serialize + DeserializeOwned + Validate + Send + 'static;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            ParentKind::Project,
            ParentKind::Task,
            ParentKind::Note,
            ParentKind::Event,
            ParentKind::Reminder,
        ] {
            assert_eq!(ParentKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(ParentKind::from_str("employee"), None);
    }

    #[test]
    fn test_table_names_are_plural() {
        assert_eq!(ParentKind::Project.table_name(), "projects");
        assert_eq!(ParentKind::Reminder.table_name(), "reminders");
    }
}
