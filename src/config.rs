//! Configuration management for the baby position validator

use crate::{
    boundary_tracker::TrackerConfig,
    constants::{
        DEFAULT_MAX_BRIGHTNESS, DEFAULT_MIN_BRIGHTNESS, DEFAULT_MIN_LANDMARKS, DEFAULT_PASS_RATE_THRESHOLD,
        DEFAULT_VISIBILITY_THRESHOLD,
    },
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model configuration
    pub models: ModelConfig,

    /// Boundary tracker configuration
    pub tracker: TrackerConfig,

    /// Per-frame validation thresholds
    pub validation: ValidationConfig,

    /// Pose detection configuration
    pub pose_detection: PoseDetectionConfig,

    /// Face detection configuration
    pub face_detection: FaceDetectionConfig,

    /// Display configuration
    pub display: DisplayConfig,
}

/// Model file paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to pose landmark ONNX model
    pub pose_landmarks: PathBuf,

    /// Path to face detection ONNX model
    pub face_detector: PathBuf,
}

/// Per-frame validation thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Lowest acceptable mean brightness (0-255)
    pub min_brightness: f64,

    /// Highest acceptable mean brightness (0-255)
    pub max_brightness: f64,

    /// Visible pose landmarks required for a pass
    pub min_landmarks: usize,

    /// Visibility above which a pose landmark counts
    pub visibility_threshold: f32,

    /// Session pass rate required for an overall PASS
    pub pass_rate_threshold: f64,
}

/// Pose detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseDetectionConfig {
    /// Person-present score below which a frame has no pose (0.0-1.0)
    pub min_presence: f32,
}

/// Face detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceDetectionConfig {
    /// Confidence threshold for face detection (0.0-1.0)
    pub confidence_threshold: f32,

    /// IOU threshold for non-maximum suppression (0.0-1.0)
    pub nms_threshold: f32,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show the annotated video window
    pub show_window: bool,

    /// Window title
    pub window_name: String,

    /// Key wait per frame for video files, in milliseconds
    pub file_wait_ms: i32,

    /// Key wait per frame for live cameras, in milliseconds
    pub camera_wait_ms: i32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            pose_landmarks: PathBuf::from("assets/pose_landmark_full.onnx"),
            face_detector: PathBuf::from("assets/face_detector.onnx"),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_brightness: DEFAULT_MIN_BRIGHTNESS,
            max_brightness: DEFAULT_MAX_BRIGHTNESS,
            min_landmarks: DEFAULT_MIN_LANDMARKS,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            pass_rate_threshold: DEFAULT_PASS_RATE_THRESHOLD,
        }
    }
}

impl Default for PoseDetectionConfig {
    fn default() -> Self {
        Self { min_presence: 0.5 }
    }
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            nms_threshold: 0.4,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_window: true,
            window_name: "Baby Video Validation".to_string(),
            file_wait_ms: 30,
            camera_wait_ms: 1,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the YAML is malformed.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate thresholds and tracker parameters
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.tracker.validate()?;

        let v = &self.validation;
        if !(0.0..=255.0).contains(&v.min_brightness) || !(0.0..=255.0).contains(&v.max_brightness) {
            return Err(Error::ConfigError(
                "Brightness bounds must be between 0 and 255".to_string(),
            ));
        }
        if v.min_brightness > v.max_brightness {
            return Err(Error::ConfigError(
                "Minimum brightness must not exceed maximum brightness".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&v.visibility_threshold) {
            return Err(Error::ConfigError(
                "Visibility threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&v.pass_rate_threshold) {
            return Err(Error::ConfigError(
                "Pass rate threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.pose_detection.min_presence) {
            return Err(Error::ConfigError(
                "Pose presence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.face_detection.confidence_threshold) {
            return Err(Error::ConfigError(
                "Face confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.face_detection.nms_threshold) {
            return Err(Error::ConfigError(
                "NMS threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.display.file_wait_ms < 1 || self.display.camera_wait_ms < 1 {
            return Err(Error::ConfigError("Key wait must be at least 1 ms".to_string()));
        }

        Ok(())
    }

    /// Check that the configured model files exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` naming the first missing model.
    pub fn validate_models(&self) -> Result<()> {
        if !self.models.pose_landmarks.exists() {
            return Err(Error::ConfigError(format!(
                "Pose landmark model not found: {}",
                self.models.pose_landmarks.display()
            )));
        }
        if !self.models.face_detector.exists() {
            return Err(Error::ConfigError(format!(
                "Face detector model not found: {}",
                self.models.face_detector.display()
            )));
        }
        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Baby Position Validator Configuration

# Model paths
models:
  pose_landmarks: "assets/pose_landmark_full.onnx"
  face_detector: "assets/face_detector.onnx"

# Boundary tracking
tracker:
  buffer_distance: 50
  stretch_threshold: 5
  initialization_frames: 30
  min_history_points: 20
  require_complete_warmup: false

# Per-frame checks
validation:
  min_brightness: 50.0
  max_brightness: 200.0
  min_landmarks: 30
  visibility_threshold: 0.5
  pass_rate_threshold: 0.8

# Pose detection parameters
pose_detection:
  min_presence: 0.5

# Face detection parameters
face_detection:
  confidence_threshold: 0.5
  nms_threshold: 0.4

# Display settings
display:
  show_window: true
  window_name: "Baby Video Validation"
  file_wait_ms: 30
  camera_wait_ms: 1
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        let defaults = Config::default();

        assert_eq!(parsed.tracker, defaults.tracker);
        assert_eq!(parsed.validation.min_landmarks, defaults.validation.min_landmarks);
        assert_eq!(parsed.models.face_detector, defaults.models.face_detector);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed = Config::from_yaml("tracker:\n  initialization_frames: 10\n").unwrap();

        assert_eq!(parsed.tracker.initialization_frames, 10);
        assert_eq!(parsed.tracker.buffer_distance, 50);
        assert!((parsed.validation.max_brightness - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_brightness_window() {
        let mut config = Config::default();
        config.validation.min_brightness = 210.0;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(Config::from_yaml("tracker: [1, 2"), Err(Error::ConfigError(_))));
    }
}
