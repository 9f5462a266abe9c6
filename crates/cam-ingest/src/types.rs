use thiserror::Error;

/// Raw BGR frame captured from the camera.
pub struct Frame {
    pub data: Vec<u8>,
    pub width: i32,
    pub height: i32,
    pub timestamp_ms: i64,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device could not be acquired at startup. Remediation text is owned
    /// by the presentation layer, not by this crate.
    #[error("camera device {device:?} is unavailable")]
    Unavailable { device: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
