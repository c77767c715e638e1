//! Template rendering adapters.

pub mod engine;
pub mod simple;
pub mod values;

pub use engine::TemplateError;
pub use simple::SimpleRenderer;
