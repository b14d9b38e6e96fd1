//! Constants used throughout the application

/// Pixels added around the observed landmark extremes when a boundary is built
pub const DEFAULT_BUFFER_DISTANCE: i32 = 50;

/// How far past the boundary a landmark must reach before the box expands
pub const DEFAULT_STRETCH_THRESHOLD: i32 = 5;

/// Frames observed before the boundary is established
pub const DEFAULT_INITIALIZATION_FRAMES: u32 = 30;

/// Minimum number of landmark points collected during warm-up
pub const DEFAULT_MIN_HISTORY_POINTS: usize = 20;

/// Grayscale brightness bounds (0-255 scale, inclusive)
pub const DEFAULT_MIN_BRIGHTNESS: f64 = 50.0;
pub const DEFAULT_MAX_BRIGHTNESS: f64 = 200.0;

/// Visible pose landmarks required for a frame to pass
pub const DEFAULT_MIN_LANDMARKS: usize = 30;

/// Pose landmark visibility above which a landmark counts as visible
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.5;

/// Session pass rate required for an overall PASS
pub const DEFAULT_PASS_RATE_THRESHOLD: f64 = 0.8;

/// Consecutive camera read failures tolerated before the camera is treated as gone
pub const MAX_CONSECUTIVE_READ_FAILURES: u32 = 30;

/// Pause between camera read retries in milliseconds
pub const READ_RETRY_DELAY_MS: u64 = 100;

/// Number of body landmarks in the pose model output
pub const NUM_POSE_LANDMARKS: usize = 33;

/// Values per landmark in the pose model output (x, y, z, visibility, presence)
pub const POSE_LANDMARK_STRIDE: usize = 5;

/// Image normalization constants for face detection
pub const IMAGE_NORMALIZATION_OFFSET: f32 = 127.5;
pub const IMAGE_NORMALIZATION_SCALE: f32 = 128.0;
