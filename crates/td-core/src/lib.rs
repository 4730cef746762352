//! # td-core
//!
//! Core types, errors, and configuration for TaskDesk.
//!
//! This crate provides the foundational building blocks used across all
//! other crates:
//! - Record identifiers (`RecordId`)
//! - The shared error taxonomy (`CoreError`)
//! - Timestamp normalization helpers
//! - Application configuration

pub mod config;
pub mod error;
pub mod id;
pub mod time;

pub use config::{AppConfig, BlobBackend, BlobStoreConfig, ConfigError, ServerConfig};
pub use error::CoreError;
pub use id::RecordId;
pub use time::{normalize_timestamp, now};
