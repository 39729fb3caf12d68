//! facegate-core — decision pipeline for the face access-control demo.
//!
//! Detection and identity assignment are capability traits; the bundled
//! implementations are explicit stand-ins (frame differencing, coordinate
//! arithmetic), not recognition models.

pub mod detector;
pub mod evidence;
pub mod matcher;
pub mod pipeline;
pub mod registry;
pub mod types;

pub use matcher::{CoordinateMatcher, IdentityMatch, IdentityMatcher};
pub use pipeline::{FramePipeline, PipelineError};
pub use registry::KnownIdentityRegistry;
pub use types::{AccessRecord, DetectionResult, Embedding, FaceRegion, UNKNOWN_IDENTITY};
