//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `chartcheck-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `BundleLoader`: Chart loading
//!   - `TemplateRenderer`: Template rendering

pub mod output;

pub use output::{BundleLoader, TemplateRenderer};

#[cfg(test)]
pub use output::{MockBundleLoader, MockTemplateRenderer};
