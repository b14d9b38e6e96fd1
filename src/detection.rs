//! Landmark detection seam between raw frames and validation.

use crate::{
    config::Config,
    face_detection::FaceDetector,
    landmarks::Detections,
    pose_detection::PoseDetector,
    Error, Result,
};
use opencv::core::Mat;
use std::collections::VecDeque;
use std::path::Path;

/// Anything that can turn a frame into pose landmarks and face boxes
pub trait LandmarkDetector {
    /// Detect landmarks in a BGR frame
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be processed.
    fn detect(&mut self, frame: &Mat) -> Result<Detections>;
}

/// Pose and face detection backed by `ONNX` models
pub struct OnnxLandmarkDetector {
    pose: PoseDetector,
    face: FaceDetector,
}

impl OnnxLandmarkDetector {
    /// Load both models named in the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if either model fails to load.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pose = PoseDetector::new(&config.models.pose_landmarks, config.pose_detection.min_presence)?;
        let face = FaceDetector::new(
            &config.models.face_detector,
            config.face_detection.confidence_threshold,
            config.face_detection.nms_threshold,
        )?;
        Ok(Self { pose, face })
    }
}

impl LandmarkDetector for OnnxLandmarkDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Detections> {
        Ok(Detections {
            pose: self.pose.detect(frame)?,
            faces: self.face.detect(frame)?,
        })
    }
}

/// Replays a fixed sequence of detections, one per call, then reports nothing
#[derive(Debug, Clone, Default)]
pub struct ScriptedDetector {
    frames: VecDeque<Detections>,
}

impl ScriptedDetector {
    #[must_use]
    pub fn new(frames: Vec<Detections>) -> Self {
        Self { frames: frames.into() }
    }

    /// Load detections recorded as one JSON object per line.
    ///
    /// Blank lines stand for frames where nothing was detected.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a line is not valid JSON.
    pub fn from_json_lines<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let frames = content
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if line.trim().is_empty() {
                    return Ok(Detections::default());
                }
                serde_json::from_str(line)
                    .map_err(|e| Error::InvalidInput(format!("Bad detections on line {}: {e}", i + 1)))
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!("Loaded {} recorded detection frames", frames.len());
        Ok(Self::new(frames))
    }

    /// Detections still queued
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &Mat) -> Result<Detections> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}
