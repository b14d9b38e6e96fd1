//! SCRFD face detector producing relative face boxes.

use crate::{
    constants::{IMAGE_NORMALIZATION_OFFSET, IMAGE_NORMALIZATION_SCALE},
    landmarks::FaceBox,
    utils::safe_cast::usize_to_i32,
    Error, Result,
};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Rect, Scalar, Size, CV_8UC3};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Default SCRFD input size
const DEFAULT_INPUT_SIZE: i32 = 640;

/// Face box in detector input pixels, before rescaling to the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
}

impl Candidate {
    fn area(&self) -> f32 {
        (self.x2 - self.x1 + 1.0) * (self.y2 - self.y1 + 1.0)
    }

    fn iou(&self, other: &Self) -> f32 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1) + 1.0).max(0.0);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1) + 1.0).max(0.0);
        let inter = w * h;
        inter / (self.area() + other.area() - inter)
    }
}

/// SCRFD face detector using ONNX Runtime
pub struct FaceDetector {
    session: Session,
    input_size: (i32, i32),
    conf_threshold: f32,
    nms_threshold: f32,
    num_anchors: usize,
    strides: Vec<i32>,
    center_cache: HashMap<(i32, i32, i32), Vec<(f32, f32)>>,
}

impl FaceDetector {
    /// Create a new face detector from an ONNX model file
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded or has no inputs.
    pub fn new<P: AsRef<Path>>(model_path: P, conf_threshold: f32, nms_threshold: f32) -> Result<Self> {
        log::info!("Initializing FaceDetector with model: {}", model_path.as_ref().display());
        let environment = Arc::new(
            Environment::builder()
                .with_name("face_detector")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        let input_meta = session
            .inputs
            .first()
            .ok_or_else(|| Error::ModelInputError("Model has no inputs".to_string()))?;

        // Dimensions are [batch, channels, height, width]; dynamic axes fall back to 640
        #[allow(clippy::cast_possible_wrap)]
        let input_size = if input_meta.dimensions.len() >= 4 {
            let height = input_meta.dimensions[2].map_or(DEFAULT_INPUT_SIZE, |d| d as i32);
            let width = input_meta.dimensions[3].map_or(DEFAULT_INPUT_SIZE, |d| d as i32);
            (width, height)
        } else {
            (DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE)
        };

        // Keypoint outputs, when present, come after scores and boxes and are ignored
        let (strides, num_anchors) = match session.outputs.len() {
            6 | 9 => (vec![8, 16, 32], 2),
            10 | 15 => (vec![8, 16, 32, 64, 128], 1),
            n => {
                log::warn!("Unknown face model configuration with {n} outputs, using defaults");
                (vec![8, 16, 32], 2)
            }
        };

        Ok(Self {
            session,
            input_size,
            conf_threshold,
            nms_threshold,
            num_anchors,
            strides,
            center_cache: HashMap::new(),
        })
    }

    /// Detect faces and report them relative to the frame size
    ///
    /// # Errors
    ///
    /// Returns an error if preprocessing or inference fails.
    pub fn detect(&mut self, image: &Mat) -> Result<Vec<FaceBox>> {
        let img_width = image.cols();
        let img_height = image.rows();
        if img_width <= 0 || img_height <= 0 {
            return Err(Error::InvalidInput("Cannot detect faces in an empty frame".to_string()));
        }

        let (det_img, det_scale) = self.letterbox(image)?;
        let inputs = preprocess(&det_img)?;
        let candidates = self.forward(inputs)?;
        let kept = non_max_suppression(candidates, self.nms_threshold);

        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (img_width as f32, img_height as f32);
        Ok(kept
            .into_iter()
            .map(|c| {
                let (x1, y1) = (c.x1 / det_scale, c.y1 / det_scale);
                let (x2, y2) = (c.x2 / det_scale, c.y2 / det_scale);
                FaceBox {
                    xmin: x1 / w,
                    ymin: y1 / h,
                    width: (x2 - x1) / w,
                    height: (y2 - y1) / h,
                    score: c.score,
                }
            })
            .collect())
    }

    /// Resize keeping aspect ratio and pad to the model input size
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn letterbox(&self, image: &Mat) -> Result<(Mat, f32)> {
        let (input_width, input_height) = self.input_size;
        let ratio_img = image.rows() as f32 / image.cols() as f32;
        let ratio_model = input_height as f32 / input_width as f32;

        let (new_width, new_height) = if ratio_img > ratio_model {
            ((input_height as f32 / ratio_img) as i32, input_height)
        } else {
            (input_width, (input_width as f32 * ratio_img) as i32)
        };
        let det_scale = new_height as f32 / image.rows() as f32;

        let mut resized = Mat::default();
        imgproc::resize(
            image,
            &mut resized,
            Size::new(new_width, new_height),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut det_img = Mat::new_rows_cols_with_default(input_height, input_width, CV_8UC3, Scalar::all(0.0))?;
        let mut roi = det_img.roi_mut(Rect::new(0, 0, new_width, new_height))?;
        resized.copy_to(&mut roi)?;

        Ok((det_img, det_scale))
    }

    /// Run the model and decode every anchor above the confidence threshold
    fn forward(&mut self, inputs: Array4<f32>) -> Result<Vec<Candidate>> {
        let input_height = usize_to_i32(inputs.shape()[2])?;
        let input_width = usize_to_i32(inputs.shape()[3])?;

        let cow_array = CowArray::from(inputs.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;
        let outputs = self.session.run(vec![input_tensor])?;

        let fmc = self.strides.len();
        if outputs.len() < fmc * 2 {
            return Err(Error::ModelOutputError(format!(
                "Expected at least {} outputs, got {}",
                fmc * 2,
                outputs.len()
            )));
        }

        let mut candidates = Vec::new();
        for (idx, &stride) in self.strides.iter().enumerate() {
            let scores_output = outputs[idx].try_extract::<f32>()?;
            let scores_view = scores_output.view();
            let scores = scores_view
                .as_slice()
                .ok_or_else(|| Error::ModelOutputError("Score tensor is not contiguous".to_string()))?;

            let bbox_output = outputs[idx + fmc].try_extract::<f32>()?;
            let bbox_view = bbox_output.view();
            let distances = bbox_view
                .as_slice()
                .ok_or_else(|| Error::ModelOutputError("Box tensor is not contiguous".to_string()))?;

            let (grid_h, grid_w) = (input_height / stride, input_width / stride);
            let num_anchors = self.num_anchors;
            let centers = self
                .center_cache
                .entry((grid_h, grid_w, stride))
                .or_insert_with(|| generate_anchor_centers(grid_h, grid_w, stride, num_anchors));
            #[allow(clippy::cast_precision_loss)]
            let stride_f = stride as f32;

            for (i, (&score, &(cx, cy))) in scores.iter().zip(centers.iter()).enumerate() {
                if score < self.conf_threshold {
                    continue;
                }
                let Some(d) = distances.get(i * 4..i * 4 + 4) else {
                    break;
                };
                candidates.push(Candidate {
                    x1: cx - d[0] * stride_f,
                    y1: cy - d[1] * stride_f,
                    x2: cx + d[2] * stride_f,
                    y2: cy + d[3] * stride_f,
                    score,
                });
            }
        }

        Ok(candidates)
    }
}

/// BGR u8 image to normalized RGB NCHW tensor
fn preprocess(image: &Mat) -> Result<Array4<f32>> {
    let mut rgb_image = Mat::default();
    imgproc::cvt_color(image, &mut rgb_image, imgproc::COLOR_BGR2RGB, 0)?;

    #[allow(clippy::cast_sign_loss)]
    let (height, width) = (rgb_image.rows() as usize, rgb_image.cols() as usize);
    let mut array = Array4::<f32>::zeros((1, 3, height, width));

    for row in 0..height {
        for col in 0..width {
            let pixel = rgb_image.at_2d::<opencv::core::Vec3b>(usize_to_i32(row)?, usize_to_i32(col)?)?;
            for ch in 0..3 {
                array[[0, ch, row, col]] =
                    (f32::from(pixel[ch]) - IMAGE_NORMALIZATION_OFFSET) / IMAGE_NORMALIZATION_SCALE;
            }
        }
    }

    Ok(array)
}

/// Anchor centers for one stride, repeated `num_anchors` times per cell
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn generate_anchor_centers(height: i32, width: i32, stride: i32, num_anchors: usize) -> Vec<(f32, f32)> {
    let mut centers = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let center = ((x * stride) as f32, (y * stride) as f32);
            centers.extend(std::iter::repeat(center).take(num_anchors.max(1)));
        }
    }
    centers
}

/// Greedy NMS keeping the highest-scoring box of each overlapping group
#[must_use]
pub fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut keep: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if keep.iter().all(|k| k.iou(&candidate) <= iou_threshold) {
            keep.push(candidate);
        }
    }
    keep
}
