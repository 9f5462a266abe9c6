//! OpenCV-backed webcam capture.

use std::thread;

use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender};
use opencv::{
    core::{self, MatTraitConstManual},
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait},
};
use tracing::debug;

use crate::types::{CaptureError, Frame};

/// Spawns a background thread that continually captures frames from `device`.
///
/// The device is opened before the thread starts, so acquisition failure is
/// returned to the caller as [`CaptureError::Unavailable`] instead of dying
/// inside the capture thread. Frames are resized to `target_size` (width,
/// height) and forwarded over the returned [`Receiver`]. The channel buffer is
/// intentionally small: when the consumer falls behind, the capture loop
/// blocks on the freshest frames instead of queueing stale ones.
pub fn spawn_camera_reader(
    device: &str,
    target_size: (i32, i32),
) -> Result<Receiver<Frame>, CaptureError> {
    let mut cap = open_video_capture(device)?;
    configure_camera(&mut cap, target_size, 30.0);

    let (tx, rx) = bounded(2);
    thread::Builder::new()
        .name("cam-ingest".into())
        .spawn(move || capture_loop(cap, target_size, tx))
        .map_err(|err| CaptureError::Other(err.into()))?;

    Ok(rx)
}

/// Main capture loop executed on the background thread.
///
/// A failed or empty read skips the cycle silently; there is no backoff and no
/// error surfaced downstream. The loop only ends when the receiver is dropped.
fn capture_loop(mut cap: VideoCapture, target_size: (i32, i32), tx: Sender<Frame>) {
    let mut frame = Mat::default();
    let mut scratch = Mat::default();
    let (target_w, target_h) = target_size;

    loop {
        match cap.read(&mut frame) {
            Ok(true) => {}
            Ok(false) => {
                debug!("camera returned no frame, skipping cycle");
                continue;
            }
            Err(err) => {
                debug!("camera read failed ({err}), skipping cycle");
                continue;
            }
        }

        let size = match frame.size() {
            Ok(size) if size.width > 0 && size.height > 0 => size,
            _ => continue,
        };

        let working = if size.width != target_w || size.height != target_h {
            let resized = opencv::imgproc::resize(
                &frame,
                &mut scratch,
                core::Size {
                    width: target_w,
                    height: target_h,
                },
                0.0,
                0.0,
                opencv::imgproc::INTER_LINEAR,
            );
            if let Err(err) = resized {
                debug!("frame resize failed ({err}), skipping cycle");
                continue;
            }
            &scratch
        } else {
            &frame
        };

        let data = match working.data_bytes() {
            Ok(bytes) => bytes.to_vec(),
            Err(err) => {
                debug!("frame readback failed ({err}), skipping cycle");
                continue;
            }
        };

        if tx
            .send(Frame {
                data,
                width: target_w,
                height: target_h,
                timestamp_ms: Utc::now().timestamp_millis(),
            })
            .is_err()
        {
            break;
        }
    }
}

/// Parse a `/dev/videoX` style path or bare index into a zero-based index.
pub fn parse_device_index(device: &str) -> Option<i32> {
    if let Ok(index) = device.parse::<i32>() {
        return Some(index);
    }
    if let Some(stripped) = device.strip_prefix("/dev/video") {
        if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(index) = stripped.parse::<i32>() {
                return Some(index);
            }
        }
    }
    None
}

/// Attempt to open the camera by index, preferring the V4L backend.
fn open_video_capture(device: &str) -> Result<VideoCapture, CaptureError> {
    if let Some(index) = parse_device_index(device) {
        for backend in [videoio::CAP_V4L, videoio::CAP_ANY] {
            if let Ok(cap) = VideoCapture::new(index, backend) {
                if matches!(cap.is_opened(), Ok(true)) {
                    return Ok(cap);
                }
            }
        }
    }

    Err(CaptureError::Unavailable {
        device: device.to_string(),
    })
}

/// Apply common capture settings (resolution, fps, preferred pixel format).
fn configure_camera(cap: &mut VideoCapture, target_size: (i32, i32), fps: f64) {
    if let Ok(mjpg) = videoio::VideoWriter::fourcc('M', 'J', 'P', 'G') {
        let _ = cap.set(videoio::CAP_PROP_FOURCC, mjpg as f64);
    }
    let _ = cap.set(videoio::CAP_PROP_FRAME_WIDTH, target_size.0 as f64);
    let _ = cap.set(videoio::CAP_PROP_FRAME_HEIGHT, target_size.1 as f64);
    let _ = cap.set(videoio::CAP_PROP_FPS, fps);
    let _ = cap.set(videoio::CAP_PROP_BUFFERSIZE, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_index() {
        assert_eq!(parse_device_index("0"), Some(0));
        assert_eq!(parse_device_index("3"), Some(3));
    }

    #[test]
    fn parses_dev_video_path() {
        assert_eq!(parse_device_index("/dev/video0"), Some(0));
        assert_eq!(parse_device_index("/dev/video12"), Some(12));
    }

    #[test]
    fn rejects_non_device_strings() {
        assert_eq!(parse_device_index("/dev/video"), None);
        assert_eq!(parse_device_index("/dev/videoX"), None);
        assert_eq!(parse_device_index("rtsp://camera"), None);
    }

    #[test]
    fn unavailable_error_names_the_device() {
        let err = CaptureError::Unavailable {
            device: "/dev/video7".to_string(),
        };
        assert!(err.to_string().contains("/dev/video7"));
    }
}
