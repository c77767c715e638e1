//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "check a chart".

pub mod check_service;

pub use check_service::{
    CheckRequest, CheckService, DEFAULT_CHART, DEFAULT_CHART_VERSION, DEFAULT_NAMESPACE,
    DEFAULT_RELEASE_NAME, DEFAULT_VALUES_FILE,
};
