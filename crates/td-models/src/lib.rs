//! # td-models
//!
//! Canonical domain models for TaskDesk.
//!
//! Earlier revisions of the system carried several divergent schemas for
//! the same entities; this crate collapses each entity into a single
//! canonical shape with optional fields. Every attachment-capable entity
//! carries a nullable `attachment` locator alongside its row in the record
//! store; the `files` table holds the normalized metadata.

pub mod employee;
pub mod event;
pub mod note;
pub mod parent;
pub mod project;
pub mod reminder;
pub mod status;
pub mod task;

pub use employee::{Employee, EmployeeDraft};
pub use event::{Event, EventDraft};
pub use note::{Note, NoteDraft};
pub use parent::{ParentKind, ParentModel, ParentRef};
pub use project::{Project, ProjectDraft};
pub use reminder::{Reminder, ReminderDraft};
pub use status::{Priority, Status};
pub use task::{Task, TaskDraft};
