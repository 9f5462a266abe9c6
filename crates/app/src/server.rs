//! Actix Web publisher exposing the landmark snapshot and the MJPEG feed.
//!
//! The server runs on a dedicated thread so the capture loop never touches
//! the Actix runtime. Both handlers are read-only: they observe the shared
//! cells the capture loop keeps overwriting.

use std::time::Duration;

use actix_web::{
    http::header,
    web::{self, Bytes},
    App, HttpResponse, HttpServer,
};
use anyhow::{Context, Result};
use async_stream::stream;
use tokio::sync::oneshot;
use tracing::error;

use crate::data::{SharedFrame, SnapshotStore};

/// Interval between MJPEG parts, roughly 30 per second.
const STREAM_TICK: Duration = Duration::from_millis(33);

/// Shared state backing HTTP handlers.
pub(crate) struct ServerState {
    pub(crate) snapshots: SnapshotStore,
    pub(crate) latest_frame: SharedFrame,
}

/// Handle for the publisher thread.
#[derive(Default)]
pub(crate) struct Publisher {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl Publisher {
    /// Signal the server to stop and block until the thread exits.
    pub(crate) fn stop(self) {
        if let Some(tx) = self.shutdown {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle {
            let _ = handle.join();
        }
    }
}

/// Spawn the publisher thread bound to `port` and return a stop handle.
pub(crate) fn spawn_publisher(
    snapshots: SnapshotStore,
    latest_frame: SharedFrame,
    port: u16,
) -> Result<Publisher> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = std::thread::Builder::new()
        .name("pose-relay-server".into())
        .spawn(move || {
            if let Err(err) = actix_web::rt::System::new().block_on(async move {
                let server = HttpServer::new(move || {
                    App::new()
                        .app_data(web::Data::new(ServerState {
                            snapshots: snapshots.clone(),
                            latest_frame: latest_frame.clone(),
                        }))
                        .route("/latest-frame", web::get().to(latest_frame_handler))
                        .route("/video_feed", web::get().to(video_feed_handler))
                })
                .bind(("0.0.0.0", port))?
                .run();

                let srv_handle = server.handle();
                actix_web::rt::spawn(async move {
                    let _ = shutdown_rx.await;
                    srv_handle.stop(true).await;
                });

                server.await
            }) {
                error!("HTTP server error: {err}");
            }
        })
        .context("Failed to spawn publisher thread")?;

    Ok(Publisher {
        shutdown: Some(shutdown_tx),
        handle: Some(handle),
    })
}

/// Return the current snapshot as JSON. Always 200: before the first frame is
/// processed the empty default snapshot is served.
async fn latest_frame_handler(state: web::Data<ServerState>) -> HttpResponse {
    let snapshot = state.snapshots.read();
    HttpResponse::Ok().json(snapshot.as_ref())
}

/// Stream the annotated MJPEG feed over a multipart response.
///
/// Parts are only produced once a frame exists; the sequence never terminates
/// on its own, and a slow consumer simply sees the newest frame repeated.
async fn video_feed_handler(state: web::Data<ServerState>) -> HttpResponse {
    let state = state.clone();
    let stream = stream! {
        let mut interval = actix_web::rt::time::interval(STREAM_TICK);
        loop {
            interval.tick().await;
            let frame = state
                .latest_frame
                .lock()
                .ok()
                .and_then(|guard| guard.clone());
            if let Some(packet) = frame {
                let mut payload = Vec::with_capacity(packet.jpeg.len() + 64);
                payload.extend_from_slice(b"--frame\r\n");
                payload.extend_from_slice(
                    format!("X-Sequence: {}\r\n", packet.frame_number).as_bytes(),
                );
                payload.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
                payload.extend_from_slice(&packet.jpeg);
                payload.extend_from_slice(b"\r\n");
                yield Ok::<Bytes, actix_web::Error>(Bytes::from(payload));
            }
        }
    };

    HttpResponse::Ok()
        .append_header(("Cache-Control", "no-cache"))
        .append_header((
            header::CONTENT_TYPE,
            "multipart/x-mixed-replace; boundary=frame",
        ))
        .streaming(stream)
}
