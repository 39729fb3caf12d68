//! Evidence sink: cropped region images written as JPEG files.

use crate::types::FaceRegion;
use chrono::Utc;
use image::GrayImage;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("region lies outside the frame")]
    EmptyCrop,
    #[error("frame buffer too short: expected {expected} bytes, got {actual}")]
    ShortBuffer { expected: usize, actual: usize },
    #[error("image write failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

/// Directory sink for cropped face regions.
pub struct EvidenceDir {
    dir: PathBuf,
}

impl EvidenceDir {
    /// Create the sink, making the directory if needed.
    pub fn create(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Crop the region (clamped to frame bounds) from a grayscale frame and
    /// write it as `{prefix}_{timestamp}_{tag}.jpg`. Returns the saved path.
    pub fn save_region(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        region: &FaceRegion,
        prefix: &str,
    ) -> Result<PathBuf, EvidenceError> {
        let expected = (width as usize) * (height as usize);
        if pixels.len() < expected {
            return Err(EvidenceError::ShortBuffer {
                expected,
                actual: pixels.len(),
            });
        }

        let crop = region
            .clamped(width, height)
            .ok_or(EvidenceError::EmptyCrop)?;

        let mut out = GrayImage::new(crop.width, crop.height);
        for cy in 0..crop.height {
            let row = ((crop.y + cy) * width + crop.x) as usize;
            for cx in 0..crop.width {
                out.put_pixel(cx, cy, image::Luma([pixels[row + cx as usize]]));
            }
        }

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let tag = Uuid::new_v4().simple().to_string();
        let filename = format!("{prefix}_{stamp}_{}.jpg", &tag[..8]);
        let path = self.dir.join(filename);
        out.save(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Vec<u8> {
        (0..width * height).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_save_region_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let sink = EvidenceDir::create(dir.path().join("evidence")).unwrap();

        let frame = gradient_frame(64, 48);
        let region = FaceRegion::new(8, 8, 16, 16);
        let path = sink.save_region(&frame, 64, 48, &region, "known").unwrap();

        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("known_"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_save_region_clamps_to_frame() {
        let dir = tempfile::tempdir().unwrap();
        let sink = EvidenceDir::create(dir.path()).unwrap();

        let frame = gradient_frame(32, 32);
        let region = FaceRegion::new(24, 24, 100, 100);
        let path = sink.save_region(&frame, 32, 32, &region, "unknown").unwrap();

        let saved = image::open(&path).unwrap();
        assert_eq!(saved.width(), 8);
        assert_eq!(saved.height(), 8);
    }

    #[test]
    fn test_save_region_outside_frame_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sink = EvidenceDir::create(dir.path()).unwrap();

        let frame = gradient_frame(32, 32);
        let region = FaceRegion::new(40, 0, 8, 8);
        let err = sink
            .save_region(&frame, 32, 32, &region, "unknown")
            .unwrap_err();
        assert!(matches!(err, EvidenceError::EmptyCrop));
    }

    #[test]
    fn test_save_region_short_buffer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sink = EvidenceDir::create(dir.path()).unwrap();

        let err = sink
            .save_region(&[0u8; 16], 32, 32, &FaceRegion::new(0, 0, 8, 8), "known")
            .unwrap_err();
        assert!(matches!(err, EvidenceError::ShortBuffer { .. }));
    }
}
