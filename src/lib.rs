//! Baby position validator for infant monitoring video.
//!
//! This library checks, frame by frame, that a baby stays inside a learned
//! region of the camera view and that the picture is usable:
//! - ONNX Runtime for pose landmark and face detection
//! - `OpenCV` for video input, brightness measurement and display
//! - An adaptive bounding box that is learned during a warm-up period and
//!   only ever grows afterwards
//!
//! The validation pipeline consists of:
//! 1. Landmark detection (33 body landmarks plus face boxes)
//! 2. Boundary tracking through warm-up, establishment and expansion
//! 3. Lighting, in-frame and landmark-count checks per frame
//! 4. A session report with an overall PASS or FAIL verdict
//!
//! # Examples
//!
//! ## Tracking a Boundary
//!
//! ```no_run
//! use baby_position_validator::boundary_tracker::{BoundaryTracker, TrackerConfig};
//! use baby_position_validator::landmarks::LandmarkPoint;
//!
//! let mut tracker = BoundaryTracker::new(TrackerConfig::default());
//! let points = vec![LandmarkPoint::pose(320.0, 240.0), LandmarkPoint::pose(400.0, 300.0)];
//!
//! for _ in 0..40 {
//!     let update = tracker.process(&points, 640, 480);
//!     println!("{} {:?}", update.status(), update.boundary());
//! }
//! ```
//!
//! ## Validating a Video
//!
//! ```no_run
//! use baby_position_validator::{
//!     app::ValidationSession,
//!     config::Config,
//!     detection::{LandmarkDetector, OnnxLandmarkDetector},
//! };
//! use opencv::{core::Mat, prelude::*, videoio};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let mut detector = OnnxLandmarkDetector::from_config(&config)?;
//! let mut session = ValidationSession::new(&config);
//!
//! let mut cap = videoio::VideoCapture::from_file("baby.mp4", videoio::CAP_ANY)?;
//! let mut frame = Mat::default();
//! while cap.read(&mut frame)? && !frame.empty() {
//!     let detections = detector.detect(&frame)?;
//!     let result = session.step(&frame, &detections)?;
//!     println!("frame {} passed: {}", result.frame_index, result.frame_passed);
//! }
//!
//! println!("{}", session.report());
//! # Ok(())
//! # }
//! ```

/// Axis-aligned pixel boundary and frame containment
pub mod boundary;

/// Adaptive bounding box state machine
pub mod boundary_tracker;

/// Landmark types and conversion to pixel points
pub mod landmarks;

/// Frame brightness checks
pub mod lighting;

/// Per-frame validation
pub mod validator;

/// Session pass rate and final verdict
pub mod report;

/// Detector seam between frames and landmarks
pub mod detection;

/// Face detection module for finding face boxes in frames
pub mod face_detection;

/// Full-body pose landmark detection
pub mod pose_detection;

/// Drawing validation results onto frames
pub mod overlay;

/// Utility functions for numeric conversions
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
