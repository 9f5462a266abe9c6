//! Capture-and-publish loop tying camera, estimator, classifier, store, and
//! the HTTP publisher together.
//!
//! One producer overwrites the shared snapshot and frame cells; the publisher
//! reads them on demand. The loop never terminates on its own, only through
//! the shutdown flag or a dead capture thread.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, Once,
    },
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use crossbeam_channel::RecvTimeoutError;
use tracing::{debug, info, warn};

use cam_ingest::spawn_camera_reader;

use crate::{
    annotation::annotate_frame,
    config::RelayConfig,
    data::{FramePacket, SharedFrame, SnapshotStore},
    estimator::{BlazePose, PoseEstimator},
    landmarks::classify,
    server::spawn_publisher,
};

/// How long a single recv waits before re-checking the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

/// Run the pipeline until Ctrl+C.
pub fn run(config: RelayConfig) -> Result<()> {
    static CTRL_HANDLER: Once = Once::new();

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_shutdown = shutdown.clone();
    CTRL_HANDLER.call_once(move || {
        if let Err(err) =
            ctrlc::set_handler(move || handler_shutdown.store(true, Ordering::SeqCst))
        {
            warn!("Failed to install Ctrl+C handler: {err}");
        }
    });

    run_until(config, shutdown)
}

/// Run the pipeline until `shutdown` is raised.
///
/// Split out from [`run`] so callers (and tests) can request a clean stop
/// instead of killing the process. The camera is acquired before the HTTP
/// listener is bound: a fatal camera error leaves no listener behind.
pub fn run_until(config: RelayConfig, shutdown: Arc<AtomicBool>) -> Result<()> {
    let receiver = spawn_camera_reader(&config.camera, (config.width, config.height))?;
    let mut estimator =
        BlazePose::new(&config.model_path).context("Failed to initialise pose estimator")?;

    let snapshots = SnapshotStore::default();
    let latest_frame: SharedFrame = Arc::new(Mutex::new(None));
    let publisher = spawn_publisher(snapshots.clone(), latest_frame.clone(), config.port)?;

    info!(
        "Serving http://0.0.0.0:{}/latest-frame and /video_feed (camera {})",
        config.port, config.camera
    );

    let mut frame_number: u64 = 0;
    let mut smoothed_fps: f32 = 0.0;
    let mut last_instant = Instant::now();

    while !shutdown.load(Ordering::Relaxed) {
        let frame = match receiver.recv_timeout(SHUTDOWN_POLL) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                publisher.stop();
                bail!("capture thread terminated unexpectedly");
            }
        };

        frame_number = frame_number.wrapping_add(1);
        let now = Instant::now();
        let elapsed = now.duration_since(last_instant).as_secs_f32();
        last_instant = now;
        if elapsed > 0.0 {
            let instant = 1.0 / elapsed;
            smoothed_fps = if smoothed_fps == 0.0 {
                instant
            } else {
                0.9 * smoothed_fps + 0.1 * instant
            };
        }

        // Inference faults are handled like a failed frame read: skip the
        // cycle, keep the loop alive.
        let points = match estimator.estimate(&frame) {
            Ok(Some(points)) => points,
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Inference failed on frame #{frame_number}: {err:#}");
                continue;
            }
        };

        let snapshot = classify(points);

        match annotate_frame(&frame, &snapshot, config.jpeg_quality, config.min_visibility) {
            Ok(jpeg) => {
                if let Ok(mut guard) = latest_frame.lock() {
                    *guard = Some(FramePacket { jpeg, frame_number });
                }
            }
            Err(err) => warn!("Annotation failed on frame #{frame_number}: {err:#}"),
        }

        snapshots.publish(snapshot);

        if frame_number % 30 == 0 {
            debug!("Capture heartbeat: frame #{frame_number}, {smoothed_fps:.1} fps");
        }
    }

    debug!("Stopping capture loop");
    publisher.stop();
    Ok(())
}
