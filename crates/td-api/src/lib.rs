//! # td-api
//!
//! REST surface for TaskDesk: one generic handler set over the five
//! attachment-capable entities, plus employees and file routes. Handlers
//! validate at the edge and hand everything attachment-shaped to the
//! coordinator.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use extractors::{AppState, CreateBody};
pub use routes::router;
