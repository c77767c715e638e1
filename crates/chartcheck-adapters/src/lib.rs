//! Infrastructure adapters for chartcheck.
//!
//! This crate implements the ports defined in `chartcheck-core::application::ports`.
//! It contains all filesystem access and the template engine.

pub mod bundle_loader;
pub mod renderer;

// Re-export commonly used adapters
pub use bundle_loader::DirectoryBundleLoader;
pub use renderer::SimpleRenderer;
