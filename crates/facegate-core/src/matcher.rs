//! Identity assignment capability.
//!
//! [`CoordinateMatcher`] is the demo stand-in: identity is derived from
//! bounding-box arithmetic, not from comparing faces. [`EmbeddingMatcher`]
//! is the shape a real deployment replaces it with — probe embedding against
//! an enrolled gallery.

use crate::registry::KnownIdentityRegistry;
use crate::types::{Embedding, FaceRegion, UNKNOWN_IDENTITY};
use thiserror::Error;

/// Confidence floor and span applied when a region maps to a known person.
const KNOWN_CONFIDENCE_FLOOR: f32 = 0.8;
const KNOWN_CONFIDENCE_SPAN: f32 = 0.2;
/// Confidence floor and span applied when no identity can be assigned.
const UNKNOWN_CONFIDENCE_FLOOR: f32 = 0.3;
const UNKNOWN_CONFIDENCE_SPAN: f32 = 0.5;

/// Identity and confidence assigned to one detected region.
#[derive(Debug, Clone)]
pub struct IdentityMatch {
    /// [`UNKNOWN_IDENTITY`] when unmatched.
    pub identity: String,
    pub confidence: f32,
}

impl IdentityMatch {
    fn unknown(confidence: f32) -> Self {
        Self {
            identity: UNKNOWN_IDENTITY.to_string(),
            confidence,
        }
    }

    pub fn is_known(&self) -> bool {
        self.identity != UNKNOWN_IDENTITY
    }
}

/// Strategy for assigning an identity to a detected region.
pub trait IdentityMatcher: Send {
    fn assign(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        region: &FaceRegion,
        registry: &KnownIdentityRegistry,
    ) -> IdentityMatch;
}

/// Coordinate-arithmetic matcher.
///
/// Selects `names[x mod count]` from the registry and scales a size-based
/// confidence into the known band. This simulates recognition without ever
/// looking at pixels; swap in [`EmbeddingMatcher`] for a real comparison.
pub struct CoordinateMatcher;

impl IdentityMatcher for CoordinateMatcher {
    fn assign(
        &mut self,
        _pixels: &[u8],
        _width: u32,
        _height: u32,
        region: &FaceRegion,
        registry: &KnownIdentityRegistry,
    ) -> IdentityMatch {
        let base = region.base_confidence();
        match registry.name_for_offset(region.x as usize) {
            Some(name) => IdentityMatch {
                identity: name.to_string(),
                confidence: KNOWN_CONFIDENCE_FLOOR + base * KNOWN_CONFIDENCE_SPAN,
            },
            None => IdentityMatch::unknown(UNKNOWN_CONFIDENCE_FLOOR + base * UNKNOWN_CONFIDENCE_SPAN),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("embedding extraction failed: {0}")]
    Failed(String),
}

/// Embedding extraction capability. Model internals are out of scope here;
/// implementations wrap whatever inference stack the deployment uses.
pub trait EmbeddingExtractor: Send {
    fn extract(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        region: &FaceRegion,
    ) -> Result<Embedding, ExtractorError>;
}

/// An enrolled face for gallery comparison.
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    pub name: String,
    pub embedding: Embedding,
}

/// Embedding-distance matcher with constant-time gallery traversal.
///
/// Always iterates every gallery entry, no early exit, so timing does not
/// leak gallery size or match position. Below `min_similarity` the region
/// stays unknown.
pub struct EmbeddingMatcher<E> {
    extractor: E,
    gallery: Vec<GalleryEntry>,
    min_similarity: f32,
}

impl<E: EmbeddingExtractor> EmbeddingMatcher<E> {
    pub fn new(extractor: E, gallery: Vec<GalleryEntry>, min_similarity: f32) -> Self {
        Self {
            extractor,
            gallery,
            min_similarity,
        }
    }
}

impl<E: EmbeddingExtractor> IdentityMatcher for EmbeddingMatcher<E> {
    fn assign(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        region: &FaceRegion,
        _registry: &KnownIdentityRegistry,
    ) -> IdentityMatch {
        let probe = match self.extractor.extract(pixels, width, height, region) {
            Ok(embedding) => embedding,
            Err(err) => {
                tracing::warn!(error = %err, "embedding extraction failed; region stays unknown");
                return IdentityMatch::unknown(0.0);
            }
        };

        let mut best_similarity = f32::NEG_INFINITY;
        let mut best_idx: Option<usize> = None;

        for (i, entry) in self.gallery.iter().enumerate() {
            let similarity = probe.similarity(&entry.embedding);
            if similarity > best_similarity {
                best_similarity = similarity;
                best_idx = Some(i);
            }
        }

        let confidence = if best_similarity == f32::NEG_INFINITY {
            0.0
        } else {
            best_similarity.clamp(0.0, 1.0)
        };

        match best_idx {
            Some(idx) if best_similarity >= self.min_similarity => IdentityMatch {
                identity: self.gallery[idx].name.clone(),
                confidence,
            },
            _ => IdentityMatch::unknown(confidence),
        }
    }
}
