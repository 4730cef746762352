//! Request handlers

pub mod employees;
pub mod files;
pub mod parents;
