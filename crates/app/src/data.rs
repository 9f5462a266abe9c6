use std::sync::{Arc, Mutex};

use crate::landmarks::PoseSnapshot;

/// Latest annotated JPEG produced by the capture loop.
#[derive(Clone)]
pub(crate) struct FramePacket {
    pub(crate) jpeg: Vec<u8>,
    pub(crate) frame_number: u64,
}

/// Single-writer snapshot cell shared between the capture loop and the HTTP
/// handlers.
///
/// `publish` builds a fresh immutable handle and swaps it in as one unit, so
/// a concurrent `read` always observes either the previous or the new
/// snapshot in its entirety, never a partial mix. No queue, no history.
#[derive(Clone, Default)]
pub(crate) struct SnapshotStore {
    inner: Arc<Mutex<Arc<PoseSnapshot>>>,
}

impl SnapshotStore {
    /// Replace the stored snapshot. Called only by the capture loop.
    pub(crate) fn publish(&self, snapshot: PoseSnapshot) {
        let handle = Arc::new(snapshot);
        match self.inner.lock() {
            Ok(mut guard) => *guard = handle,
            Err(mut poisoned) => **poisoned.get_mut() = handle,
        }
    }

    /// Current snapshot, or the empty default before the first publish.
    pub(crate) fn read(&self) -> Arc<PoseSnapshot> {
        match self.inner.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

pub(crate) type SharedFrame = Arc<Mutex<Option<FramePacket>>>;

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::landmarks::{classify, LandmarkPoint};

    fn uniform_points(value: f32) -> Vec<LandmarkPoint> {
        (0..5)
            .map(|id| LandmarkPoint {
                id,
                x: value,
                y: value,
                z: value,
                visibility: 1.0,
            })
            .collect()
    }

    #[test]
    fn read_before_publish_is_the_empty_default() {
        let store = SnapshotStore::default();
        let snapshot = store.read();
        assert!(snapshot.points.is_empty());
    }

    #[test]
    fn publish_replaces_the_whole_value() {
        let store = SnapshotStore::default();
        store.publish(classify(uniform_points(0.25)));
        store.publish(classify(uniform_points(0.75)));
        let snapshot = store.read();
        assert_eq!(snapshot.points[0].x, 0.75);
    }

    #[test]
    fn readers_never_observe_a_mixed_snapshot() {
        let store = SnapshotStore::default();
        let writer_store = store.clone();

        let writer = thread::spawn(move || {
            for seq in 0..2_000u32 {
                writer_store.publish(classify(uniform_points(seq as f32)));
            }
        });
        let reader = thread::spawn(move || {
            for _ in 0..2_000 {
                let snapshot = store.read();
                if let Some(first) = snapshot.points.first() {
                    assert!(
                        snapshot
                            .points
                            .iter()
                            .all(|p| p.x == first.x && p.y == first.x && p.z == first.x),
                        "observed fields from two different publishes"
                    );
                }
            }
        });

        writer.join().unwrap();
        reader.join().unwrap();
    }
}
