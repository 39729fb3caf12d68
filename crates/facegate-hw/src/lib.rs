//! facegate-hw — camera capture and frame handling.
//!
//! Provides V4L2-based camera access behind the [`FrameSource`] seam, plus a
//! synthetic source for runs without hardware.

pub mod camera;
pub mod frame;
pub mod source;

pub use camera::{Camera, CameraError, DeviceInfo};
pub use frame::Frame;
pub use source::{FrameSource, SyntheticSource};
