//! Application layer for chartcheck.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (CheckService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer sequences the domain layer; decoding rules live in
//! `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{CheckRequest, CheckService};

// Re-export port traits (for adapter implementation)
pub use ports::{BundleLoader, TemplateRenderer};

pub use error::ApplicationError;
