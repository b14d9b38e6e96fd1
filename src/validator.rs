//! Per-frame validation combining boundary tracking with lighting and
//! landmark visibility checks.

use crate::{
    boundary::{is_in_frame, Boundary},
    boundary_tracker::{BoundaryTracker, BoxStatus, TrackerUpdate},
    config::Config,
    landmarks::{collect_landmark_points, count_visible_landmarks, Detections},
    lighting::LightingCheck,
    Result,
};
use log::{debug, info};
use opencv::{core::Mat, prelude::*};
use serde::Serialize;

/// Outcome of validating one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameResult {
    /// 1-based index of the frame within the session
    pub frame_index: u64,
    /// Current boundary, absent during warm-up or after failed initialization
    pub bbox: Option<Boundary>,
    /// Tracker status for this frame
    pub box_status: BoxStatus,
    /// Warm-up frames with landmarks so far; zero after warm-up
    pub init_progress: usize,
    /// Mean grayscale brightness
    pub brightness: f64,
    pub lighting_ok: bool,
    pub bbox_in_frame: bool,
    /// Pose landmarks above the visibility threshold
    pub visible_landmarks: usize,
    pub frame_passed: bool,
}

/// Validates a stream of frames for one monitoring session
pub struct FrameValidator {
    config: Config,
    tracker: BoundaryTracker,
    lighting: LightingCheck,
    frames_seen: u64,
}

impl FrameValidator {
    /// Create a validator with a fresh tracker
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            tracker: BoundaryTracker::new(config.tracker.clone()),
            lighting: LightingCheck::new(config.validation.min_brightness, config.validation.max_brightness),
            config: config.clone(),
            frames_seen: 0,
        }
    }

    /// Validate a frame given the detector output for it
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is empty or its brightness cannot be measured.
    pub fn validate(&mut self, frame: &Mat, detections: &Detections) -> Result<FrameResult> {
        let reading = self.lighting.check(frame)?;
        Ok(self.validate_with_brightness(reading.brightness, frame.cols(), frame.rows(), detections))
    }

    /// Validate a frame whose brightness has already been measured
    pub fn validate_with_brightness(
        &mut self,
        brightness: f64,
        frame_width: i32,
        frame_height: i32,
        detections: &Detections,
    ) -> FrameResult {
        self.frames_seen += 1;
        let threshold = self.config.validation.visibility_threshold;

        let points = collect_landmark_points(detections, frame_width, frame_height, threshold);
        let update = self.tracker.process(&points, frame_width, frame_height);

        let lighting_ok = self.lighting.is_acceptable(brightness);
        let visible_landmarks = count_visible_landmarks(&detections.pose, threshold);
        let bbox = update.boundary();
        let bbox_in_frame = is_in_frame(bbox.as_ref(), frame_width, frame_height);
        let frame_passed = evaluate_frame(
            &update,
            lighting_ok,
            bbox_in_frame,
            visible_landmarks,
            self.config.validation.min_landmarks,
        );

        debug!(
            "Frame {}: status={} lighting_ok={} in_frame={} landmarks={} passed={}",
            self.frames_seen,
            update.status(),
            lighting_ok,
            bbox_in_frame,
            visible_landmarks,
            frame_passed
        );

        FrameResult {
            frame_index: self.frames_seen,
            bbox,
            box_status: update.status(),
            init_progress: update.init_progress(),
            brightness,
            lighting_ok,
            bbox_in_frame,
            visible_landmarks,
            frame_passed,
        }
    }

    /// Discard the tracker and begin a new session.
    ///
    /// This is the only way out of `INITIALIZATION_FAILED`.
    pub fn restart_session(&mut self) {
        info!("Restarting validation session after {} frames", self.frames_seen);
        self.tracker = BoundaryTracker::new(self.config.tracker.clone());
        self.frames_seen = 0;
    }

    #[must_use]
    pub fn tracker(&self) -> &BoundaryTracker {
        &self.tracker
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Overall pass/fail for a frame.
///
/// A frame without a boundary always fails, whatever its lighting and
/// landmark count.
#[must_use]
pub fn evaluate_frame(
    update: &TrackerUpdate,
    lighting_ok: bool,
    bbox_in_frame: bool,
    visible_landmarks: usize,
    min_landmarks: usize,
) -> bool {
    update.boundary().is_some() && lighting_ok && bbox_in_frame && visible_landmarks >= min_landmarks
}
