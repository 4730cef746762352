//! Event model
//!
//! Table: events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use td_core::time::flexible;
use td_core::RecordId;
use validator::Validate;

use crate::parent::{ParentKind, ParentModel};

/// A calendar event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "flexible")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "flexible")]
    pub end_time: DateTime<Utc>,
    /// Event category (meeting, deadline, ...). Free-form by design; the
    /// frontend defines the vocabulary.
    #[serde(rename = "type")]
    pub kind: String,
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
pub struct EventDraft {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "flexible")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "flexible")]
    pub end_time: DateTime<Utc>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 64))]
    pub kind: String,
    #[serde(default)]
    pub project_id: Option<RecordId>,
}

impl ParentModel for Event {
    const KIND: ParentKind = ParentKind::Event;
    const HAS_STATUS: bool = false;
    const PROJECT_SCOPED: bool = true;
    type Draft = EventDraft;
}
