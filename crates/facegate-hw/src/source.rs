//! Frame source seam over camera hardware and synthetic generators.

use crate::camera::CameraError;
use crate::frame::Frame;

/// Blocking frame producer for the decision loop.
pub trait FrameSource: Send {
    /// Short description for logs.
    fn describe(&self) -> String;

    /// Next frame. `Ok(None)` means the stream ended; an error means the
    /// source failed and the caller should stop reading.
    fn read_frame(&mut self) -> Result<Option<Frame>, CameraError>;
}

/// Background luma of synthetic frames.
const SYNTHETIC_BACKGROUND: u8 = 16;
/// Luma of the moving block.
const SYNTHETIC_BLOCK: u8 = 230;
/// Horizontal step of the block between frames.
const SYNTHETIC_STRIDE: u32 = 7;

/// Procedural frame generator for camera-less runs and tests.
///
/// Renders a bright block drifting across a dark background; the block moves
/// every frame, so frame-difference detection fires, and its x position
/// varies, so coordinate-based identity assignment cycles through the
/// registry.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    block: u32,
    sequence: u32,
    remaining: Option<u64>,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            block: (height / 4).max(1),
            sequence: 0,
            remaining: None,
        }
    }

    /// Stop after `frames` frames instead of running unbounded.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }

    fn render(&self, x0: u32, y0: u32) -> Vec<u8> {
        let mut data = vec![SYNTHETIC_BACKGROUND; (self.width * self.height) as usize];
        for y in y0..(y0 + self.block).min(self.height) {
            let row = y * self.width;
            for x in x0..(x0 + self.block).min(self.width) {
                data[(row + x) as usize] = SYNTHETIC_BLOCK;
            }
        }
        data
    }
}

impl FrameSource for SyntheticSource {
    fn describe(&self) -> String {
        format!("synthetic {}x{}", self.width, self.height)
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        match self.remaining.as_mut() {
            Some(0) => return Ok(None),
            Some(left) => *left -= 1,
            None => {}
        }

        let travel = self.width.saturating_sub(self.block).max(1);
        let x0 = self.sequence.wrapping_mul(SYNTHETIC_STRIDE) % travel;
        let y0 = (self.height.saturating_sub(self.block)) / 2;

        let frame = Frame {
            data: self.render(x0, y0),
            width: self.width,
            height: self.height,
            sequence: self.sequence,
        };
        self.sequence = self.sequence.wrapping_add(1);
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_respects_limit() {
        let mut source = SyntheticSource::new(64, 64).with_limit(2);
        assert!(source.read_frame().unwrap().is_some());
        assert!(source.read_frame().unwrap().is_some());
        assert!(source.read_frame().unwrap().is_none());
        assert!(source.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_synthetic_frames_change_between_reads() {
        let mut source = SyntheticSource::new(64, 64);
        let first = source.read_frame().unwrap().unwrap();
        let second = source.read_frame().unwrap().unwrap();
        assert_ne!(first.data, second.data, "block must move between frames");
        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
    }

    #[test]
    fn test_synthetic_frame_is_lit() {
        let mut source = SyntheticSource::new(64, 64);
        let frame = source.read_frame().unwrap().unwrap();
        assert_eq!(frame.data.len(), 64 * 64);
        assert!(frame.avg_brightness() > SYNTHETIC_BACKGROUND as f32);
        assert!(frame.data.iter().any(|&p| p == SYNTHETIC_BLOCK));
    }
}
