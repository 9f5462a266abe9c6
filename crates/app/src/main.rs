//! pose-relay: capture webcam frames, run body-pose estimation, and republish
//! the latest skeletal landmarks over HTTP.
//!
//! The binary wires four pieces together:
//! - `cam-ingest`: camera acquisition on a background thread.
//! - `estimator`: ONNX pose inference over each frame.
//! - `landmarks`: pure classification of landmark points into leg/foot groups.
//! - `server`: actix-web publisher for the JSON snapshot and the MJPEG feed.

mod annotation;
mod config;
mod data;
mod estimator;
mod landmarks;
mod pipeline;
mod server;
mod telemetry;

use std::{process, thread, time::Duration};

use cam_ingest::CaptureError;

use crate::config::RelayConfig;

/// Delay before exiting on a fatal camera error so the message stays visible
/// when the process was launched from a desktop shell.
const EXIT_DELAY: Duration = Duration::from_secs(3);

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let config = match RelayConfig::from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            process::exit(2);
        }
    };

    telemetry::init(config.verbose);

    if let Err(err) = pipeline::run(config) {
        match err.downcast_ref::<CaptureError>() {
            Some(CaptureError::Unavailable { device }) => {
                eprintln!("ERROR: could not open camera {device}.");
                eprintln!("{}", camera_remediation());
            }
            _ => eprintln!("{err:?}"),
        }
        thread::sleep(EXIT_DELAY);
        process::exit(1);
    }
}

/// Platform hint for camera-permission failures. The capture layer reports a
/// structured error kind; the wording lives here with the rest of the CLI
/// surface.
fn camera_remediation() -> &'static str {
    if cfg!(target_os = "macos") {
        "On macOS, allow camera access for your terminal under System Settings \
         > Privacy & Security > Camera, then retry."
    } else if cfg!(target_os = "windows") {
        "On Windows, enable camera access for desktop apps under Settings > \
         Privacy & security > Camera, then retry."
    } else {
        "On Linux, check that the device exists under /dev/video* and that \
         your user is in the `video` group, then retry."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remediation_hint_names_the_host_operating_system() {
        let hint = camera_remediation();
        let os = if cfg!(target_os = "macos") {
            "macOS"
        } else if cfg!(target_os = "windows") {
            "Windows"
        } else {
            "Linux"
        };
        assert!(hint.contains(os));
    }

    #[test]
    fn remediation_hint_points_at_camera_settings() {
        let hint = camera_remediation();
        assert!(hint.to_lowercase().contains("camera"));
        assert!(hint.ends_with("then retry."));
    }
}
