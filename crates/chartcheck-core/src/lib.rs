//! chartcheck Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for checking that a
//! TiDB cluster chart renders well-formed component configurations,
//! following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         chartcheck-cli (CLI)            │
//! │      (flags, config, logging)           │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │             (CheckService)              │
//! │  render → extract → decode → verdict    │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │   (Driven: BundleLoader, Renderer)      │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │   chartcheck-adapters (Infrastructure)  │
//! │ (DirectoryBundleLoader, SimpleRenderer) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (PlatformVersion, ArtifactSet, schemas) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chartcheck_core::application::{CheckRequest, CheckService};
//! # fn demo(
//! #     loader: Box<dyn chartcheck_core::application::ports::BundleLoader>,
//! #     renderer: Box<dyn chartcheck_core::application::ports::TemplateRenderer>,
//! # ) -> chartcheck_core::error::CheckResult<()> {
//! let service = CheckService::new(loader, renderer);
//! let verdict = service.check(&CheckRequest {
//!     chart: "./charts/tidb-cluster".into(),
//!     values: "my-values.yaml".into(),
//!     ..CheckRequest::default()
//! })?;
//! assert!(verdict.passed());
//! # Ok(())
//! # }
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        CheckRequest, CheckService,
        ports::{BundleLoader, TemplateRenderer},
    };
    pub use crate::domain::{
        ArtifactSet, Bundle, ChartMetadata, ComponentRole, EvaluationContext, PlatformVersion,
        RoleStatus, ValidationState, ValidationVerdict,
    };
    pub use crate::error::{CheckError, CheckResult, FailureKind};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
