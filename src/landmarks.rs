//! Detector output shapes and conversion into pixel-space landmark points.
//!
//! The landmark detector reports pose landmarks in normalized image
//! coordinates and faces as relative bounding boxes. The boundary tracker
//! works in pixels, so everything it sees goes through
//! [`collect_landmark_points`] first.

use serde::{Deserialize, Serialize};

/// Which detector produced a landmark point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandmarkSource {
    /// Body pose landmark
    Pose,
    /// Corner of a detected face box
    Face,
}

/// A landmark position in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    /// Horizontal pixel coordinate
    pub x: f32,
    /// Vertical pixel coordinate
    pub y: f32,
    /// Detector that produced the point
    pub source: LandmarkSource,
}

impl LandmarkPoint {
    /// Create a pose landmark point
    #[must_use]
    pub fn pose(x: f32, y: f32) -> Self {
        Self { x, y, source: LandmarkSource::Pose }
    }

    /// Create a face corner point
    #[must_use]
    pub fn face(x: f32, y: f32) -> Self {
        Self { x, y, source: LandmarkSource::Face }
    }
}

/// A single pose landmark as reported by the pose model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseLandmark {
    /// Normalized horizontal position (0.0-1.0)
    pub x: f32,
    /// Normalized vertical position (0.0-1.0)
    pub y: f32,
    /// Relative depth, unused by validation
    pub z: f32,
    /// Detection confidence (0.0-1.0)
    pub visibility: f32,
}

impl PoseLandmark {
    /// Create a landmark with zero depth
    #[must_use]
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, z: 0.0, visibility }
    }
}

/// A face detection as a relative bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    /// Left edge as a fraction of frame width
    pub xmin: f32,
    /// Top edge as a fraction of frame height
    pub ymin: f32,
    /// Box width as a fraction of frame width
    pub width: f32,
    /// Box height as a fraction of frame height
    pub height: f32,
    /// Detection confidence; recordings without it count as certain
    #[serde(default = "full_confidence")]
    pub score: f32,
}

fn full_confidence() -> f32 {
    1.0
}

impl FaceBox {
    /// Create a face box with full confidence
    #[must_use]
    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32) -> Self {
        Self { xmin, ymin, width, height, score: 1.0 }
    }

    /// Corners in pixel coordinates: top-left, top-right, bottom-left, bottom-right
    #[must_use]
    pub fn corners(&self, frame_width: i32, frame_height: i32) -> [LandmarkPoint; 4] {
        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (frame_width as f32, frame_height as f32);
        let left = self.xmin * w;
        let right = (self.xmin + self.width) * w;
        let top = self.ymin * h;
        let bottom = (self.ymin + self.height) * h;

        [
            LandmarkPoint::face(left, top),
            LandmarkPoint::face(right, top),
            LandmarkPoint::face(left, bottom),
            LandmarkPoint::face(right, bottom),
        ]
    }
}

/// Everything the landmark detector found in one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detections {
    /// Pose landmarks, empty when no body was found
    pub pose: Vec<PoseLandmark>,
    /// Face detections
    pub faces: Vec<FaceBox>,
}

impl Detections {
    /// Detections with only pose landmarks
    #[must_use]
    pub fn from_pose(pose: Vec<PoseLandmark>) -> Self {
        Self { pose, faces: Vec::new() }
    }

    /// True when neither detector found anything
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pose.is_empty() && self.faces.is_empty()
    }
}

/// Convert detector output into the pixel-space points tracked for the boundary.
///
/// Pose landmarks are kept only when their visibility is strictly above
/// `visibility_threshold`. Every face box contributes its four corners
/// regardless of score.
#[must_use]
pub fn collect_landmark_points(
    detections: &Detections,
    frame_width: i32,
    frame_height: i32,
    visibility_threshold: f32,
) -> Vec<LandmarkPoint> {
    #[allow(clippy::cast_precision_loss)]
    let (w, h) = (frame_width as f32, frame_height as f32);

    let mut points: Vec<LandmarkPoint> = detections
        .pose
        .iter()
        .filter(|lm| lm.visibility > visibility_threshold)
        .map(|lm| LandmarkPoint::pose(lm.x * w, lm.y * h))
        .collect();

    for face in &detections.faces {
        points.extend(face.corners(frame_width, frame_height));
    }

    points
}

/// Count pose landmarks whose visibility is strictly above the threshold
#[must_use]
pub fn count_visible_landmarks(pose: &[PoseLandmark], visibility_threshold: f32) -> usize {
    pose.iter().filter(|lm| lm.visibility > visibility_threshold).count()
}
