//! The frame decision loop: sample, detect, assign, decide, record.

use crate::detector::{DetectorError, FaceDetector};
use crate::evidence::EvidenceDir;
use crate::matcher::IdentityMatcher;
use crate::registry::KnownIdentityRegistry;
use crate::types::{AccessRecord, DetectionResult};
use chrono::Utc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Detector(#[from] DetectorError),
}

/// Decision pipeline over sampled frames.
///
/// `step` is the whole contract: frames whose index is not a multiple of the
/// process interval are skipped outright; every detected region on a sampled
/// frame yields exactly one [`AccessRecord`]. Evidence writes are best-effort
/// and never block a record.
pub struct FramePipeline<D, M> {
    detector: D,
    matcher: M,
    registry: KnownIdentityRegistry,
    threshold: f32,
    process_interval: u64,
    evidence: Option<EvidenceDir>,
}

impl<D: FaceDetector, M: IdentityMatcher> FramePipeline<D, M> {
    pub fn new(
        detector: D,
        matcher: M,
        registry: KnownIdentityRegistry,
        threshold: f32,
        process_interval: u64,
    ) -> Self {
        Self {
            detector,
            matcher,
            registry,
            threshold,
            // Interval 0 would never sample anything; treat it as every frame.
            process_interval: process_interval.max(1),
            evidence: None,
        }
    }

    /// Enable evidence crops for every decision.
    pub fn with_evidence(mut self, sink: EvidenceDir) -> Self {
        self.evidence = Some(sink);
        self
    }

    pub fn registry(&self) -> &KnownIdentityRegistry {
        &self.registry
    }

    /// Process one frame. Returns zero records for unsampled indices and for
    /// frames with no detected regions; otherwise one record per region.
    pub fn step(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        frame_index: u64,
    ) -> Result<Vec<AccessRecord>, PipelineError> {
        if frame_index % self.process_interval != 0 {
            return Ok(Vec::new());
        }

        let regions = self.detector.detect(pixels, width, height)?;
        if regions.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = Vec::with_capacity(regions.len());
        for region in &regions {
            let assigned = self
                .matcher
                .assign(pixels, width, height, region, &self.registry);

            let detection = DetectionResult {
                region: *region,
                identity: assigned.identity,
                confidence: assigned.confidence.clamp(0.0, 1.0),
            };

            let known = detection.identity != crate::types::UNKNOWN_IDENTITY;
            let granted = known && detection.confidence > self.threshold;

            let evidence_path = self.evidence.as_ref().and_then(|sink| {
                let prefix = if known { "known" } else { "unknown" };
                match sink.save_region(pixels, width, height, region, prefix) {
                    Ok(path) => Some(path.to_string_lossy().into_owned()),
                    Err(err) => {
                        tracing::warn!(error = %err, "evidence write failed; recording without image");
                        None
                    }
                }
            });

            tracing::info!(
                identity = %detection.identity,
                confidence = detection.confidence,
                granted,
                frame = frame_index,
                "access {}",
                if granted { "GRANTED" } else { "DENIED" }
            );

            records.push(AccessRecord {
                identity: detection.identity,
                timestamp: Utc::now(),
                granted,
                confidence: detection.confidence,
                evidence_path,
            });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::ScriptedDetector;
    use crate::matcher::{CoordinateMatcher, IdentityMatch};
    use crate::types::{FaceRegion, UNKNOWN_IDENTITY};

    const THRESHOLD: f32 = 0.70;

    fn frame() -> Vec<u8> {
        vec![0u8; 640 * 480]
    }

    fn pipeline_with(
        script: Vec<Vec<FaceRegion>>,
        registry: KnownIdentityRegistry,
    ) -> FramePipeline<ScriptedDetector, CoordinateMatcher> {
        FramePipeline::new(
            ScriptedDetector::new(script),
            CoordinateMatcher,
            registry,
            THRESHOLD,
            10,
        )
    }

    #[test]
    fn test_unsampled_frames_produce_no_records() {
        let registry = KnownIdentityRegistry::from_entries([("alice", 1)]);
        let mut pipeline = pipeline_with(vec![vec![FaceRegion::new(0, 0, 100, 80)]], registry);

        for index in [1u64, 3, 7, 9, 11, 19] {
            let records = pipeline.step(&frame(), 640, 480, index).unwrap();
            assert!(records.is_empty(), "frame {index} should be skipped");
        }
    }

    #[test]
    fn test_known_region_above_threshold_is_granted() {
        let registry = KnownIdentityRegistry::from_entries([("alice", 1)]);
        // Area 8000 -> base 0.8 -> boosted 0.96 > 0.70.
        let mut pipeline = pipeline_with(vec![vec![FaceRegion::new(0, 0, 100, 80)]], registry);

        let records = pipeline.step(&frame(), 640, 480, 0).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.identity, "alice");
        assert!(record.granted);
        assert!((record.confidence - 0.96).abs() < 1e-6);
        assert!(record.evidence_path.is_none());
    }

    #[test]
    fn test_empty_registry_denies_as_unknown() {
        // Area 4000 -> base 0.4 -> adjusted 0.50 <= 0.70.
        let mut pipeline = pipeline_with(
            vec![vec![FaceRegion::new(50, 10, 80, 50)]],
            KnownIdentityRegistry::default(),
        );

        let records = pipeline.step(&frame(), 640, 480, 0).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.identity, UNKNOWN_IDENTITY);
        assert!(!record.granted);
        assert!((record.confidence - 0.50).abs() < 1e-6);
    }

    #[test]
    fn test_no_regions_no_records() {
        let registry = KnownIdentityRegistry::from_entries([("alice", 1)]);
        let mut pipeline = pipeline_with(vec![vec![]], registry);
        let records = pipeline.step(&frame(), 640, 480, 0).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_one_record_per_region() {
        let registry = KnownIdentityRegistry::from_entries([("al", 1), ("mia", 1)]);
        let regions = vec![
            FaceRegion::new(0, 0, 100, 80),
            FaceRegion::new(1, 0, 100, 80),
            FaceRegion::new(2, 0, 100, 80),
        ];
        let mut pipeline = pipeline_with(vec![regions], registry);

        let records = pipeline.step(&frame(), 640, 480, 0).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].identity, "al");
        assert_eq!(records[1].identity, "mia");
        assert_eq!(records[2].identity, "al");
    }

    struct FixedMatcher {
        identity: &'static str,
        confidence: f32,
    }

    impl IdentityMatcher for FixedMatcher {
        fn assign(
            &mut self,
            _pixels: &[u8],
            _width: u32,
            _height: u32,
            _region: &FaceRegion,
            _registry: &KnownIdentityRegistry,
        ) -> IdentityMatch {
            IdentityMatch {
                identity: self.identity.to_string(),
                confidence: self.confidence,
            }
        }
    }

    #[test]
    fn test_confidence_at_threshold_is_denied() {
        let mut pipeline = FramePipeline::new(
            ScriptedDetector::new([vec![FaceRegion::new(0, 0, 10, 10)]]),
            FixedMatcher {
                identity: "alice",
                confidence: THRESHOLD,
            },
            KnownIdentityRegistry::from_entries([("alice", 1)]),
            THRESHOLD,
            1,
        );

        let records = pipeline.step(&frame(), 640, 480, 0).unwrap();
        assert!(!records[0].granted, "confidence == threshold must deny");
    }

    #[test]
    fn test_out_of_range_confidence_is_clamped() {
        let mut pipeline = FramePipeline::new(
            ScriptedDetector::new([
                vec![FaceRegion::new(0, 0, 10, 10)],
                vec![FaceRegion::new(0, 0, 10, 10)],
            ]),
            FixedMatcher {
                identity: "alice",
                confidence: 1.5,
            },
            KnownIdentityRegistry::from_entries([("alice", 1)]),
            THRESHOLD,
            1,
        );

        let records = pipeline.step(&frame(), 640, 480, 0).unwrap();
        assert_eq!(records[0].confidence, 1.0);
        assert!(records[0].granted);
    }

    #[test]
    fn test_unknown_identity_never_granted() {
        let mut pipeline = FramePipeline::new(
            ScriptedDetector::new([vec![FaceRegion::new(0, 0, 10, 10)]]),
            FixedMatcher {
                identity: UNKNOWN_IDENTITY,
                confidence: 0.99,
            },
            KnownIdentityRegistry::default(),
            THRESHOLD,
            1,
        );

        let records = pipeline.step(&frame(), 640, 480, 0).unwrap();
        assert!(!records[0].granted, "unknown identity must deny even above threshold");
    }

    #[test]
    fn test_detector_error_propagates() {
        use crate::detector::FrameDiffDetector;

        let mut pipeline = FramePipeline::new(
            FrameDiffDetector::new(),
            CoordinateMatcher,
            KnownIdentityRegistry::default(),
            THRESHOLD,
            1,
        );

        let err = pipeline.step(&[0u8; 4], 640, 480, 0).unwrap_err();
        assert!(matches!(err, PipelineError::Detector(_)));
    }
}
