// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for chartcheck.
//!
//! This module contains the validation logic itself. Loading charts and
//! evaluating templates are handled via ports (traits) defined in the
//! application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Decoders only**: serde_yaml / toml / semver are used as pure parsers
//! - **Immutable entities**: Context and verdict are read-only once built
//!
pub mod entities;
pub mod error;
pub mod schema;
pub mod value_objects;

// Re-exports for convenience
pub use entities::{
    artifact::{ArtifactSet, ClassifiedArtifact, ClassifiedArtifacts},
    bundle::{Bundle, BundleFile, ChartMetadata},
    context::{
        Capabilities, DEFAULT_API_VERSIONS, EvaluationContext, ParameterPayload, ReleaseOptions,
        RenderContextBuilder,
    },
    document::{ConfigMapDocument, extract_config},
    verdict::{RoleStatus, ValidationReporter, ValidationState, ValidationVerdict},
};

pub use error::DomainError;

pub use schema::{ConfigDecoder, DecodedConfig, PdConfig, TidbConfig};

pub use value_objects::{CONFIG_FIELD, ComponentRole, DEFAULT_PLATFORM_VERSION, PlatformVersion};
