pub mod artifact;
pub mod bundle;
pub mod context;
pub mod document;
pub mod verdict;

pub use artifact::{ArtifactSet, ClassifiedArtifact, ClassifiedArtifacts};
pub use bundle::{Bundle, BundleFile, ChartMetadata};
pub use context::{
    Capabilities, EvaluationContext, ParameterPayload, ReleaseOptions, RenderContextBuilder,
};
pub use document::{ConfigMapDocument, ObjectMeta, extract_config};
pub use verdict::{RoleStatus, ValidationReporter, ValidationState, ValidationVerdict};
