//! Body-pose landmark inference via ONNX Runtime.
//!
//! The model is an external collaborator: `PoseEstimator` is the seam the
//! pipeline depends on, and `BlazePose` is the concrete implementation for
//! MediaPipe's full-body landmark model exported to ONNX.

use std::path::Path;

use anyhow::{Context, Result};
use cam_ingest::Frame;
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

use crate::landmarks::{LandmarkIndex, LandmarkPoint};

/// Given one frame, returns one set of landmark points or "no detection".
pub trait PoseEstimator {
    fn estimate(&mut self, frame: &Frame) -> Result<Option<Vec<LandmarkPoint>>>;
}

/// Model input edge length in pixels.
pub const INPUT_SIZE: usize = 256;
/// Values per landmark in the raw output: x, y, z, visibility logit, presence.
const VALUES_PER_LANDMARK: usize = 5;
/// Pose presence score below which a frame counts as "no detection".
const PRESENCE_THRESHOLD: f32 = 0.5;

pub struct BlazePose {
    session: Session,
}

impl BlazePose {
    /// Load the ONNX landmark model from disk.
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path.as_ref())
            .context("Failed to load ONNX pose model")?;

        Ok(Self { session })
    }
}

impl PoseEstimator for BlazePose {
    /// Run one frame through the model.
    ///
    /// Outputs follow the MediaPipe export: `Identity` is the flat
    /// `[1, 195]` landmark tensor, `Identity_1` the `[1, 1]` pose presence
    /// score. A score below the threshold is not an error.
    fn estimate(&mut self, frame: &Frame) -> Result<Option<Vec<LandmarkPoint>>> {
        let input = preprocess(frame);
        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs!["input_1" => input_tensor])
            .context("Pose inference failed")?;

        let presence: ndarray::ArrayViewD<f32> = outputs
            .get("Identity_1")
            .context("Pose model has no `Identity_1` presence output")?
            .try_extract_array()
            .context("Failed to extract pose presence output")?;
        let score = presence_score(&presence).context("Pose presence output is empty")?;
        if score < PRESENCE_THRESHOLD {
            return Ok(None);
        }

        let raw: ndarray::ArrayViewD<f32> = outputs
            .get("Identity")
            .context("Pose model has no `Identity` landmark output")?
            .try_extract_array()
            .context("Failed to extract landmark output")?;
        let raw = raw
            .as_slice()
            .context("Landmark output is not contiguous")?;

        Ok(Some(decode_landmarks(raw)))
    }
}

/// First element of the presence tensor, whatever its shape. Missing or
/// oddly-shaped outputs become errors the capture loop treats as transient.
fn presence_score(view: &ndarray::ArrayViewD<f32>) -> Option<f32> {
    view.iter().copied().next()
}

/// Decode the flat landmark tensor into normalized points.
///
/// Raw x/y/z arrive in input-pixel units and are divided by the input edge;
/// the visibility logit is squashed through a sigmoid.
fn decode_landmarks(raw: &[f32]) -> Vec<LandmarkPoint> {
    let scale = INPUT_SIZE as f32;
    let count = (raw.len() / VALUES_PER_LANDMARK).min(LandmarkIndex::COUNT);

    (0..count)
        .map(|id| {
            let base = id * VALUES_PER_LANDMARK;
            LandmarkPoint {
                id: id as u32,
                x: raw[base] / scale,
                y: raw[base + 1] / scale,
                z: raw[base + 2] / scale,
                visibility: sigmoid(raw[base + 3]),
            }
        })
        .collect()
}

/// Resize the BGR frame to the model input square, swap to RGB, scale to
/// [0, 1], and lay it out as an NHWC tensor.
fn preprocess(frame: &Frame) -> Array4<f32> {
    let mut tensor = Array4::<f32>::zeros((1, INPUT_SIZE, INPUT_SIZE, 3));
    let width = frame.width.max(1) as usize;
    let height = frame.height.max(1) as usize;

    for ty in 0..INPUT_SIZE {
        let sy = ty * height / INPUT_SIZE;
        for tx in 0..INPUT_SIZE {
            let sx = tx * width / INPUT_SIZE;
            let base = (sy * width + sx) * 3;
            if base + 2 >= frame.data.len() {
                continue;
            }
            tensor[[0, ty, tx, 0]] = frame.data[base + 2] as f32 / 255.0;
            tensor[[0, ty, tx, 1]] = frame.data[base + 1] as f32 / 255.0;
            tensor[[0, ty, tx, 2]] = frame.data[base] as f32 / 255.0;
        }
    }

    tensor
}

fn sigmoid(logit: f32) -> f32 {
    1.0 / (1.0 + (-logit).exp())
}
