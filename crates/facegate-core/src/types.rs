use serde::{Deserialize, Serialize};

/// Identity recorded when no known person can be assigned to a region.
pub const UNKNOWN_IDENTITY: &str = "Unknown";

/// Region area at which the placeholder detection confidence saturates at 1.0.
const REGION_AREA_NORMALIZER: f32 = 10_000.0;

/// Axis-aligned rectangle for a detected face region, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region area in pixels.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Placeholder detection confidence derived from region size:
    /// `min(1.0, area / 10000)`. A stand-in for a real detector score.
    pub fn base_confidence(&self) -> f32 {
        (self.area() as f32 / REGION_AREA_NORMALIZER).min(1.0)
    }

    /// Intersection of this region with a `frame_width` x `frame_height`
    /// frame, for cropping. `None` if the region lies entirely outside.
    pub fn clamped(&self, frame_width: u32, frame_height: u32) -> Option<FaceRegion> {
        if self.x >= frame_width || self.y >= frame_height {
            return None;
        }
        let width = self.width.min(frame_width - self.x);
        let height = self.height.min(frame_height - self.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(FaceRegion::new(self.x, self.y, width, height))
    }
}

/// Per-region outcome of detection plus identity assignment.
/// Produced for each sampled frame; not persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub region: FaceRegion,
    pub identity: String,
    /// Always in [0, 1].
    pub confidence: f32,
}

/// One appended access decision. Records are never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRecord {
    pub identity: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub granted: bool,
    /// Always in [0, 1].
    pub confidence: f32,
    /// Path of the saved region crop, when evidence saving is enabled and
    /// the write succeeded.
    pub evidence_path: Option<String>,
}

/// Face embedding vector, used by the embedding-distance matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Cosine similarity in [-1, 1]. Higher = more similar.
    pub fn similarity(&self, other: &Embedding) -> f32 {
        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self.values.iter().zip(other.values.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom > 0.0 {
            dot / denom
        } else {
            0.0
        }
    }
}
