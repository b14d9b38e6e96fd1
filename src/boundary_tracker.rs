//! Adaptive boundary tracking for a single monitored subject.
//!
//! The tracker watches a fixed warm-up window of frames, builds a boundary
//! around every landmark it saw, then decides on each later frame whether the
//! subject stayed inside it, stretched past it, or vanished.
//!
//! Lifecycle:
//! 1. Warm-up: frames `1..=initialization_frames` only record landmarks.
//! 2. Establishment: the next frame builds the boundary from the history, or
//!    fails permanently when too few points were recorded.
//! 3. Steady state: every frame is checked for stretching; the boundary only
//!    ever changes through expansion.
//!
//! One tracker belongs to one session. Running several sessions means owning
//! several trackers.

use crate::{
    boundary::Boundary,
    constants::{
        DEFAULT_BUFFER_DISTANCE, DEFAULT_INITIALIZATION_FRAMES, DEFAULT_MIN_HISTORY_POINTS,
        DEFAULT_STRETCH_THRESHOLD,
    },
    landmarks::LandmarkPoint,
    utils::safe_cast::truncate_to_pixel,
    Error, Result,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tracker parameters, fixed for the lifetime of a tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Pixels added around landmark extremes
    pub buffer_distance: i32,

    /// Pixels a landmark must exceed the boundary by to trigger expansion
    pub stretch_threshold: i32,

    /// Number of warm-up frames
    pub initialization_frames: u32,

    /// Minimum total landmark points needed to establish a boundary
    pub min_history_points: usize,

    /// Also fail establishment when any warm-up frame had no landmarks
    pub require_complete_warmup: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            buffer_distance: DEFAULT_BUFFER_DISTANCE,
            stretch_threshold: DEFAULT_STRETCH_THRESHOLD,
            initialization_frames: DEFAULT_INITIALIZATION_FRAMES,
            min_history_points: DEFAULT_MIN_HISTORY_POINTS,
            require_complete_warmup: false,
        }
    }
}

impl TrackerConfig {
    /// Validate tracker parameters
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the buffer is not positive or the stretch
    /// threshold is negative.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_distance <= 0 {
            return Err(Error::ConfigError(
                "Buffer distance must be greater than 0".to_string(),
            ));
        }
        if self.stretch_threshold < 0 {
            return Err(Error::ConfigError(
                "Stretch threshold must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Observable tracker status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoxStatus {
    Initializing,
    InitializationFailed,
    BoundaryEstablished,
    Stable,
    StretchedAndExpanded,
    NoLandmarks,
}

impl BoxStatus {
    /// Status name as shown to users
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "INITIALIZING",
            Self::InitializationFailed => "INITIALIZATION_FAILED",
            Self::BoundaryEstablished => "BOUNDARY_ESTABLISHED",
            Self::Stable => "STABLE",
            Self::StretchedAndExpanded => "STRETCHED_AND_EXPANDED",
            Self::NoLandmarks => "NO_LANDMARKS",
        }
    }
}

impl fmt::Display for BoxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of feeding one frame to the tracker.
///
/// Statuses that always carry a boundary hold it directly, so a status
/// without its boundary cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerUpdate {
    /// Still in warm-up; `progress` is the number of history entries so far
    Initializing { progress: usize },
    /// Warm-up produced too little data; terminal for this tracker
    InitializationFailed,
    /// Boundary was built on this frame
    BoundaryEstablished(Boundary),
    /// Subject stayed within tolerance
    Stable(Boundary),
    /// Subject stretched; carries the expanded boundary
    StretchedAndExpanded(Boundary),
    /// Frame had no landmarks; carries the unchanged boundary
    NoLandmarks(Boundary),
}

impl TrackerUpdate {
    #[must_use]
    pub fn status(&self) -> BoxStatus {
        match self {
            Self::Initializing { .. } => BoxStatus::Initializing,
            Self::InitializationFailed => BoxStatus::InitializationFailed,
            Self::BoundaryEstablished(_) => BoxStatus::BoundaryEstablished,
            Self::Stable(_) => BoxStatus::Stable,
            Self::StretchedAndExpanded(_) => BoxStatus::StretchedAndExpanded,
            Self::NoLandmarks(_) => BoxStatus::NoLandmarks,
        }
    }

    #[must_use]
    pub fn boundary(&self) -> Option<Boundary> {
        match self {
            Self::Initializing { .. } | Self::InitializationFailed => None,
            Self::BoundaryEstablished(b)
            | Self::Stable(b)
            | Self::StretchedAndExpanded(b)
            | Self::NoLandmarks(b) => Some(*b),
        }
    }

    /// Warm-up progress; zero outside warm-up
    #[must_use]
    pub fn init_progress(&self) -> usize {
        match self {
            Self::Initializing { progress } => *progress,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    WarmingUp,
    Failed,
    Established(Boundary),
}

/// Stateful boundary tracker for one subject
#[derive(Debug, Clone)]
pub struct BoundaryTracker {
    config: TrackerConfig,
    frame_count: u64,
    landmark_history: Vec<Vec<LandmarkPoint>>,
    phase: Phase,
}

impl BoundaryTracker {
    /// Create a tracker with the given parameters
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            landmark_history: Vec::with_capacity(config.initialization_frames as usize),
            config,
            frame_count: 0,
            phase: Phase::WarmingUp,
        }
    }

    /// Feed one frame's landmark points to the tracker
    pub fn process(&mut self, landmarks: &[LandmarkPoint], frame_width: i32, frame_height: i32) -> TrackerUpdate {
        self.frame_count += 1;

        if self.frame_count <= u64::from(self.config.initialization_frames) {
            if !landmarks.is_empty() {
                self.landmark_history.push(landmarks.to_vec());
            }
            return TrackerUpdate::Initializing {
                progress: self.landmark_history.len(),
            };
        }

        match self.phase {
            Phase::Failed => TrackerUpdate::InitializationFailed,
            Phase::WarmingUp => match self.establish_boundary() {
                Some(boundary) => {
                    info!("Boundary established at {boundary} after {} frames", self.frame_count - 1);
                    self.phase = Phase::Established(boundary);
                    TrackerUpdate::BoundaryEstablished(boundary)
                }
                None => {
                    warn!(
                        "Boundary initialization failed: {} points in {} history frames",
                        self.history_point_count(),
                        self.landmark_history.len()
                    );
                    self.phase = Phase::Failed;
                    TrackerUpdate::InitializationFailed
                }
            },
            Phase::Established(established) => {
                if landmarks.is_empty() {
                    return TrackerUpdate::NoLandmarks(established);
                }

                match self.check_if_stretching(&established, landmarks, frame_width, frame_height) {
                    Some(expanded) => {
                        debug!("Boundary expanded from {established} to {expanded}");
                        self.phase = Phase::Established(expanded);
                        TrackerUpdate::StretchedAndExpanded(expanded)
                    }
                    None => TrackerUpdate::Stable(established),
                }
            }
        }
    }

    /// Build the boundary from the warm-up history, without clamping
    fn establish_boundary(&self) -> Option<Boundary> {
        if self.config.require_complete_warmup
            && self.landmark_history.len() < self.config.initialization_frames as usize
        {
            return None;
        }
        if self.history_point_count() < self.config.min_history_points {
            return None;
        }

        let mut points = self.landmark_history.iter().flatten();
        let first = points.next()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        #[allow(clippy::cast_precision_loss)]
        let buffer = self.config.buffer_distance as f32;
        Some(Boundary::new(
            truncate_to_pixel(min_x - buffer),
            truncate_to_pixel(min_y - buffer),
            truncate_to_pixel(max_x + buffer),
            truncate_to_pixel(max_y + buffer),
        ))
    }

    /// Expand a copy of `established` for every point reaching past it.
    ///
    /// Points are applied in order against the partially expanded candidate.
    /// Comparisons run in `f32` so saturated edges cannot overflow.
    /// Low edges are floored at 0 and high edges capped at the frame size;
    /// nothing else is clamped. Returns `None` when no edge moved.
    fn check_if_stretching(
        &self,
        established: &Boundary,
        landmarks: &[LandmarkPoint],
        frame_width: i32,
        frame_height: i32,
    ) -> Option<Boundary> {
        #[allow(clippy::cast_precision_loss)]
        let buffer = self.config.buffer_distance as f32;
        let threshold = as_f32(self.config.stretch_threshold);
        let mut bbox = *established;
        let mut expanded = false;

        for p in landmarks {
            if p.x < as_f32(bbox.x1) - threshold {
                bbox.x1 = truncate_to_pixel(p.x - buffer).max(0);
                expanded = true;
            } else if p.x > as_f32(bbox.x2) + threshold {
                bbox.x2 = truncate_to_pixel(p.x + buffer).min(frame_width);
                expanded = true;
            }

            if p.y < as_f32(bbox.y1) - threshold {
                bbox.y1 = truncate_to_pixel(p.y - buffer).max(0);
                expanded = true;
            } else if p.y > as_f32(bbox.y2) + threshold {
                bbox.y2 = truncate_to_pixel(p.y + buffer).min(frame_height);
                expanded = true;
            }
        }

        expanded.then_some(bbox)
    }

    fn history_point_count(&self) -> usize {
        self.landmark_history.iter().map(Vec::len).sum()
    }

    /// Frames processed so far
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Number of warm-up frames that contributed landmarks
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.landmark_history.len()
    }

    #[must_use]
    pub fn established_boundary(&self) -> Option<Boundary> {
        match self.phase {
            Phase::Established(b) => Some(b),
            _ => None,
        }
    }

    /// True once establishment has failed; the tracker must be replaced
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.phase == Phase::Failed
    }

    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_f32(value: i32) -> f32 {
    value as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(init: u32, min_points: usize, buffer: i32, threshold: i32) -> TrackerConfig {
        TrackerConfig {
            buffer_distance: buffer,
            stretch_threshold: threshold,
            initialization_frames: init,
            min_history_points: min_points,
            require_complete_warmup: false,
        }
    }

    fn pt(x: f32, y: f32) -> LandmarkPoint {
        LandmarkPoint::pose(x, y)
    }

    #[test]
    fn test_worked_example_establish_then_stretch() {
        let mut tracker = BoundaryTracker::new(config(2, 1, 5, 1));

        assert_eq!(tracker.process(&[pt(10.0, 10.0)], 100, 100), TrackerUpdate::Initializing { progress: 1 });
        assert_eq!(tracker.process(&[pt(20.0, 20.0)], 100, 100), TrackerUpdate::Initializing { progress: 2 });

        let established = tracker.process(&[pt(15.0, 15.0)], 100, 100);
        assert_eq!(established, TrackerUpdate::BoundaryEstablished(Boundary::new(5, 5, 25, 25)));

        let stretched = tracker.process(&[pt(40.0, 20.0)], 100, 100);
        assert_eq!(stretched, TrackerUpdate::StretchedAndExpanded(Boundary::new(5, 5, 45, 25)));
        assert_eq!(tracker.established_boundary(), Some(Boundary::new(5, 5, 45, 25)));
    }

    #[test]
    fn test_empty_warmup_frame_consumes_slot() {
        let mut tracker = BoundaryTracker::new(config(3, 1, 5, 1));

        tracker.process(&[pt(10.0, 10.0)], 100, 100);
        let update = tracker.process(&[], 100, 100);

        assert_eq!(update, TrackerUpdate::Initializing { progress: 1 });
        assert_eq!(tracker.frame_count(), 2);
        assert_eq!(tracker.history_len(), 1);
    }

    #[test]
    fn test_initialization_failure_is_terminal() {
        let mut tracker = BoundaryTracker::new(config(2, 5, 5, 1));
        tracker.process(&[pt(10.0, 10.0)], 100, 100);
        tracker.process(&[pt(20.0, 20.0)], 100, 100);

        for _ in 0..5 {
            let many: Vec<_> = (0..10).map(|i| pt(i as f32, i as f32)).collect();
            assert_eq!(tracker.process(&many, 100, 100), TrackerUpdate::InitializationFailed);
        }
        assert!(tracker.is_failed());
        assert_eq!(tracker.established_boundary(), None);
    }

    #[test]
    fn test_require_complete_warmup() {
        let mut cfg = config(2, 1, 5, 1);
        cfg.require_complete_warmup = true;
        let mut tracker = BoundaryTracker::new(cfg);

        tracker.process(&[pt(10.0, 10.0), pt(20.0, 20.0)], 100, 100);
        tracker.process(&[], 100, 100);

        assert_eq!(tracker.process(&[pt(10.0, 10.0)], 100, 100), TrackerUpdate::InitializationFailed);
    }

    #[test]
    fn test_zero_warmup_fails_without_history() {
        let mut tracker = BoundaryTracker::new(config(0, 1, 5, 1));
        assert_eq!(tracker.process(&[pt(10.0, 10.0)], 100, 100), TrackerUpdate::InitializationFailed);
    }

    #[test]
    fn test_no_landmarks_keeps_boundary() {
        let mut tracker = BoundaryTracker::new(config(1, 1, 5, 1));
        tracker.process(&[pt(50.0, 50.0)], 100, 100);
        tracker.process(&[], 100, 100);

        let update = tracker.process(&[], 100, 100);
        assert_eq!(update, TrackerUpdate::NoLandmarks(Boundary::new(45, 45, 55, 55)));
        assert_eq!(update.init_progress(), 0);
    }

    #[test]
    fn test_status_names() {
        assert_eq!(BoxStatus::StretchedAndExpanded.to_string(), "STRETCHED_AND_EXPANDED");
        assert_eq!(TrackerUpdate::InitializationFailed.status().as_str(), "INITIALIZATION_FAILED");
        assert_eq!(TrackerUpdate::Initializing { progress: 3 }.boundary(), None);
    }

    #[test]
    fn test_config_validation() {
        assert!(TrackerConfig::default().validate().is_ok());
        assert!(config(2, 1, 0, 1).validate().is_err());
        assert!(config(2, 1, 5, -1).validate().is_err());
    }
}
