//! Full-body pose landmark detection using a BlazePose-style ONNX model.
//!
//! The model takes the whole frame resized to a square RGB input and returns
//! 39 landmarks of 5 values each (x, y, z, visibility, presence), of which the
//! first 33 are body landmarks. Coordinates come back in input pixels and are
//! normalized to 0.0-1.0 here. A second output, when the model has one, is the
//! person-present score used to drop frames without a subject.

use crate::{
    constants::{NUM_POSE_LANDMARKS, POSE_LANDMARK_STRIDE},
    landmarks::PoseLandmark,
    utils::safe_cast::usize_to_i32,
    Error, Result,
};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Size, CV_32F};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Default pose model input size
const DEFAULT_POSE_INPUT_SIZE: i32 = 256;

/// Pose landmark detector using `ONNX` Runtime
pub struct PoseDetector {
    session: Session,
    input_size: i32,
    min_presence: f32,
}

impl PoseDetector {
    /// Create a new pose detector from an `ONNX` model file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The model has no inputs
    pub fn new<P: AsRef<Path>>(model_path: P, min_presence: f32) -> Result<Self> {
        log::info!("Initializing PoseDetector with model: {}", model_path.as_ref().display());
        let environment = Arc::new(
            Environment::builder()
                .with_name("pose_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        // NHWC input: [batch, height, width, channels]
        let input_meta = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelInputError("Model has no inputs".to_string()))?;
        #[allow(clippy::cast_possible_wrap)]
        let input_size = input_meta
            .dimensions
            .get(1)
            .copied()
            .flatten()
            .map_or(DEFAULT_POSE_INPUT_SIZE, |d| d as i32);

        Ok(Self {
            session,
            input_size,
            min_presence,
        })
    }

    /// Detect pose landmarks in a BGR frame.
    ///
    /// Returns an empty list when the model reports no person.
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails, or the output
    /// tensor is too small.
    pub fn detect(&self, frame: &Mat) -> Result<Vec<PoseLandmark>> {
        if frame.empty() {
            return Err(Error::InvalidInput("Cannot detect pose in an empty frame".to_string()));
        }

        let input = self.preprocess(frame)?;
        let (raw, presence) = self.forward(input)?;

        if presence.is_some_and(|p| p < self.min_presence) {
            log::debug!("Pose presence {presence:?} below {}, no subject", self.min_presence);
            return Ok(Vec::new());
        }

        #[allow(clippy::cast_precision_loss)]
        decode_landmarks(&raw, self.input_size as f32)
    }

    /// Resize to the model input, convert to RGB and scale to [0, 1]
    #[allow(clippy::cast_sign_loss)] // Input size is positive
    fn preprocess(&self, frame: &Mat) -> Result<Array4<f32>> {
        let size = self.input_size as usize;

        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut rgb_image = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb_image, imgproc::COLOR_BGR2RGB, 0)?;

        let mut float_image = Mat::default();
        rgb_image.convert_to(&mut float_image, CV_32F, 1.0 / 255.0, 0.0)?;

        let mut array = Array4::<f32>::zeros((1, size, size, 3));
        for row in 0..size {
            for col in 0..size {
                let pixel = float_image.at_2d::<opencv::core::Vec3f>(usize_to_i32(row)?, usize_to_i32(col)?)?;
                for ch in 0..3 {
                    array[[0, row, col, ch]] = pixel[ch];
                }
            }
        }

        Ok(array)
    }

    /// Run inference, returning the raw landmark tensor and presence score
    fn forward(&self, input: Array4<f32>) -> Result<(Vec<f32>, Option<f32>)> {
        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let landmarks_output = outputs
            .first()
            .ok_or_else(|| Error::ModelOutputError("No output from pose model".to_string()))?
            .try_extract::<f32>()?;
        let landmarks_view = landmarks_output.view();
        let raw = landmarks_view
            .as_slice()
            .ok_or_else(|| Error::ModelOutputError("Failed to get pose output data".to_string()))?
            .to_vec();

        let presence = match outputs.get(1) {
            Some(value) => {
                let tensor = value.try_extract::<f32>()?;
                let view = tensor.view();
                view.iter().next().copied().map(sigmoid_if_logit)
            }
            None => None,
        };

        Ok((raw, presence))
    }
}

/// Decode the first 33 landmarks from a flat model output.
///
/// # Errors
///
/// Returns `ModelOutputError` if the tensor holds fewer than 33 landmarks.
pub fn decode_landmarks(raw: &[f32], input_size: f32) -> Result<Vec<PoseLandmark>> {
    let needed = NUM_POSE_LANDMARKS * POSE_LANDMARK_STRIDE;
    if raw.len() < needed {
        return Err(Error::ModelOutputError(format!(
            "Expected at least {needed} pose values, got {}",
            raw.len()
        )));
    }

    Ok(raw[..needed]
        .chunks_exact(POSE_LANDMARK_STRIDE)
        .map(|v| PoseLandmark {
            x: v[0] / input_size,
            y: v[1] / input_size,
            z: v[2] / input_size,
            visibility: sigmoid(v[3]),
        })
        .collect())
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Some exports already apply the sigmoid to the presence flag
fn sigmoid_if_logit(x: f32) -> f32 {
    if (0.0..=1.0).contains(&x) {
        x
    } else {
        sigmoid(x)
    }
}
