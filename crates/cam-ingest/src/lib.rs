//! Webcam acquisition for the pose-relay pipeline.
//!
//! The crate owns the camera device and nothing else: a background thread
//! continually reads frames, resizes them to the requested size, and forwards
//! them over a small bounded channel. Failure to acquire the device is
//! surfaced synchronously so the caller can decide how to present it.

mod camera;
mod types;

pub use camera::{parse_device_index, spawn_camera_reader};
pub use types::{CaptureError, Frame};
