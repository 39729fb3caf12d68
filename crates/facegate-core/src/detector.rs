//! Face-detection capability seam.
//!
//! Detection model internals are out of scope for this crate; the trait is
//! the boundary a real detector plugs into. The bundled implementations are
//! stand-ins: frame differencing for live runs, scripted regions for tests.

use crate::types::FaceRegion;
use std::collections::VecDeque;
use thiserror::Error;

/// Edge length of the tiles compared by [`FrameDiffDetector`].
const DIFF_TILE_SIZE: u32 = 16;
/// Mean absolute per-pixel difference above which a tile counts as changed.
const DIFF_MEAN_THRESHOLD: f32 = 12.0;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("frame buffer too short: expected {expected} bytes, got {actual}")]
    ShortBuffer { expected: usize, actual: usize },
    #[error("detection failed: {0}")]
    Failed(String),
}

/// Region-proposal capability for a single grayscale frame.
///
/// Implementations must treat the pixel slice as read-only and return
/// regions in frame coordinates.
pub trait FaceDetector: Send {
    /// Detector identifier for logs.
    fn name(&self) -> &'static str;

    fn detect(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceRegion>, DetectorError>;
}

/// Frame-difference region proposer.
///
/// Compares each frame against the previous one tile by tile and proposes
/// the bounding box of the changed tiles as a single region. Emits nothing
/// on the first frame or after a resolution change.
pub struct FrameDiffDetector {
    previous: Option<Vec<u8>>,
    dims: (u32, u32),
}

impl FrameDiffDetector {
    pub fn new() -> Self {
        Self {
            previous: None,
            dims: (0, 0),
        }
    }
}

impl Default for FrameDiffDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceDetector for FrameDiffDetector {
    fn name(&self) -> &'static str {
        "frame-diff"
    }

    fn detect(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceRegion>, DetectorError> {
        let expected = (width as usize) * (height as usize);
        if pixels.len() < expected {
            return Err(DetectorError::ShortBuffer {
                expected,
                actual: pixels.len(),
            });
        }

        let previous = match self.previous.take() {
            Some(prev) if self.dims == (width, height) => prev,
            _ => {
                self.previous = Some(pixels[..expected].to_vec());
                self.dims = (width, height);
                return Ok(Vec::new());
            }
        };

        let mut bounds: Option<(u32, u32, u32, u32)> = None;

        let mut ty = 0;
        while ty < height {
            let tile_h = DIFF_TILE_SIZE.min(height - ty);
            let mut tx = 0;
            while tx < width {
                let tile_w = DIFF_TILE_SIZE.min(width - tx);

                let mut sum = 0u64;
                for y in ty..ty + tile_h {
                    let row = (y * width) as usize;
                    for x in tx..tx + tile_w {
                        let idx = row + x as usize;
                        sum += pixels[idx].abs_diff(previous[idx]) as u64;
                    }
                }
                let mean = sum as f32 / (tile_w * tile_h) as f32;

                if mean > DIFF_MEAN_THRESHOLD {
                    bounds = Some(match bounds {
                        None => (tx, ty, tx + tile_w, ty + tile_h),
                        Some((x0, y0, x1, y1)) => (
                            x0.min(tx),
                            y0.min(ty),
                            x1.max(tx + tile_w),
                            y1.max(ty + tile_h),
                        ),
                    });
                }
                tx += DIFF_TILE_SIZE;
            }
            ty += DIFF_TILE_SIZE;
        }

        self.previous = Some(pixels[..expected].to_vec());
        self.dims = (width, height);

        Ok(bounds
            .map(|(x0, y0, x1, y1)| vec![FaceRegion::new(x0, y0, x1 - x0, y1 - y0)])
            .unwrap_or_default())
    }
}

/// Test detector that replays queued region lists, then reports no faces.
pub struct ScriptedDetector {
    script: VecDeque<Vec<FaceRegion>>,
}

impl ScriptedDetector {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Vec<FaceRegion>>,
    {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl FaceDetector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(
        &mut self,
        _pixels: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<FaceRegion>, DetectorError> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_frame(width: u32, height: u32, value: u8) -> Vec<u8> {
        vec![value; (width * height) as usize]
    }

    #[test]
    fn test_diff_first_frame_proposes_nothing() {
        let mut detector = FrameDiffDetector::new();
        let frame = flat_frame(64, 64, 10);
        let regions = detector.detect(&frame, 64, 64).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn test_diff_static_scene_proposes_nothing() {
        let mut detector = FrameDiffDetector::new();
        let frame = flat_frame(64, 64, 10);
        detector.detect(&frame, 64, 64).unwrap();
        let regions = detector.detect(&frame, 64, 64).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn test_diff_changed_block_is_bounded() {
        let mut detector = FrameDiffDetector::new();
        let width = 64;
        let height = 64;
        let base = flat_frame(width, height, 10);
        detector.detect(&base, width, height).unwrap();

        // Brighten a 16x16 block at (16, 32).
        let mut changed = base.clone();
        for y in 32..48 {
            for x in 16..32 {
                changed[(y * width + x) as usize] = 200;
            }
        }

        let regions = detector.detect(&changed, width, height).unwrap();
        assert_eq!(regions.len(), 1);
        let region = regions[0];
        assert_eq!((region.x, region.y), (16, 32));
        assert_eq!((region.width, region.height), (16, 16));
    }

    #[test]
    fn test_diff_resolution_change_resets() {
        let mut detector = FrameDiffDetector::new();
        detector.detect(&flat_frame(64, 64, 10), 64, 64).unwrap();
        let regions = detector.detect(&flat_frame(32, 32, 200), 32, 32).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn test_diff_short_buffer_errors() {
        let mut detector = FrameDiffDetector::new();
        let err = detector.detect(&[0u8; 10], 64, 64).unwrap_err();
        assert!(matches!(err, DetectorError::ShortBuffer { .. }));
    }

    #[test]
    fn test_scripted_replays_then_empties() {
        let region = FaceRegion::new(1, 2, 3, 4);
        let mut detector = ScriptedDetector::new([vec![region], vec![]]);
        assert_eq!(detector.detect(&[], 0, 0).unwrap(), vec![region]);
        assert!(detector.detect(&[], 0, 0).unwrap().is_empty());
        assert!(detector.detect(&[], 0, 0).unwrap().is_empty());
    }
}
