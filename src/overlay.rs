//! Annotated display of validation results.

use crate::{
    boundary_tracker::BoxStatus,
    landmarks::PoseLandmark,
    utils::safe_cast::f32_to_i32_clamp,
    validator::FrameResult,
    Result,
};
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};

/// Body skeleton edges between the 33 pose landmarks
pub const POSE_CONNECTIONS: [(usize, usize); 35] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 7),
    (0, 4),
    (4, 5),
    (5, 6),
    (6, 8),
    (9, 10),
    (11, 12),
    (11, 13),
    (13, 15),
    (15, 17),
    (15, 19),
    (15, 21),
    (17, 19),
    (12, 14),
    (14, 16),
    (16, 18),
    (16, 20),
    (16, 22),
    (18, 20),
    (11, 23),
    (12, 24),
    (23, 24),
    (23, 25),
    (24, 26),
    (25, 27),
    (26, 28),
    (27, 29),
    (28, 30),
    (29, 31),
    (30, 32),
    (27, 31),
    (28, 32),
];

/// Width reserved for the session counters in the top-right corner
const HUD_OFFSET: i32 = 250;

fn yellow() -> Scalar {
    Scalar::new(0.0, 255.0, 255.0, 0.0)
}

fn green() -> Scalar {
    Scalar::new(0.0, 255.0, 0.0, 0.0)
}

fn red() -> Scalar {
    Scalar::new(0.0, 0.0, 255.0, 0.0)
}

fn cyan() -> Scalar {
    Scalar::new(255.0, 255.0, 0.0, 0.0)
}

fn white() -> Scalar {
    Scalar::new(255.0, 255.0, 255.0, 0.0)
}

/// Session counters shown alongside each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionHud {
    /// 1-based index of the frame on screen
    pub frame_index: u64,
    /// Total frames in the source, when known
    pub total_frames: Option<u64>,
    /// Seconds into the video
    pub timestamp: f64,
    /// Pass rate so far, absent during warm-up
    pub pass_rate: Option<f64>,
}

impl SessionHud {
    fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(3);
        lines.push(match self.total_frames {
            Some(total) => format!("Frame: {}/{total}", self.frame_index),
            None => format!("Frame: {}", self.frame_index),
        });
        lines.push(format!("Time: {:.1}s", self.timestamp));
        if let Some(rate) = self.pass_rate {
            lines.push(format!("Pass Rate: {:.1}%", rate * 100.0));
        }
        lines
    }
}

/// Headline text for a frame
#[must_use]
pub fn status_text(result: &FrameResult, initialization_frames: u32) -> String {
    if result.box_status == BoxStatus::Initializing {
        format!("INITIALIZING ({}/{initialization_frames})", result.init_progress)
    } else if result.frame_passed {
        "PASS".to_string()
    } else {
        "FAIL".to_string()
    }
}

fn status_color(result: &FrameResult) -> Scalar {
    if result.box_status == BoxStatus::Initializing {
        cyan()
    } else if result.frame_passed {
        green()
    } else {
        red()
    }
}

/// Boundary color: yellow while expanding, otherwise green or red by outcome
#[must_use]
pub fn boundary_color(result: &FrameResult) -> Scalar {
    if result.box_status == BoxStatus::StretchedAndExpanded {
        yellow()
    } else if result.frame_passed {
        green()
    } else {
        red()
    }
}

/// Draw the boundary, skeleton and status lines onto a copy of `frame`
///
/// # Errors
///
/// Returns an error if an `OpenCV` drawing call fails.
pub fn draw_overlay(
    frame: &Mat,
    result: &FrameResult,
    pose: &[PoseLandmark],
    visibility_threshold: f32,
    initialization_frames: u32,
) -> Result<Mat> {
    let mut overlay = frame.clone();

    if let Some(bbox) = result.bbox {
        let color = boundary_color(result);
        imgproc::rectangle_points(
            &mut overlay,
            Point::new(bbox.x1, bbox.y1),
            Point::new(bbox.x2, bbox.y2),
            color,
            2,
            LINE_8,
            0,
        )?;
        let (cx, cy) = bbox.center();
        imgproc::circle(&mut overlay, Point::new(cx, cy), 5, color, -1, LINE_8, 0)?;
    }

    draw_skeleton(&mut overlay, pose, visibility_threshold)?;

    imgproc::put_text(
        &mut overlay,
        &status_text(result, initialization_frames),
        Point::new(10, 40),
        FONT_HERSHEY_SIMPLEX,
        1.2,
        status_color(result),
        3,
        LINE_8,
        false,
    )?;

    let details = [
        format!("Box: {}", result.box_status),
        format!("Lighting: {}", if result.lighting_ok { "OK" } else { "FAIL" }),
        format!("BBox in frame: {}", if result.bbox_in_frame { "YES" } else { "NO" }),
        format!("Landmarks: {}", result.visible_landmarks),
    ];
    for (line, y) in details.iter().zip([70, 100, 130, 160]) {
        put_small_text(&mut overlay, line, Point::new(10, y))?;
    }

    Ok(overlay)
}

/// Draw frame counter, timestamp and running pass rate in the top-right corner
///
/// # Errors
///
/// Returns an error if an `OpenCV` drawing call fails.
pub fn draw_session_hud(frame: &mut Mat, hud: &SessionHud) -> Result<()> {
    let x = frame.cols() - HUD_OFFSET;
    for (line, y) in hud.lines().iter().zip([30, 60, 90]) {
        put_small_text(frame, line, Point::new(x, y))?;
    }
    Ok(())
}

fn put_small_text(frame: &mut Mat, text: &str, origin: Point) -> Result<()> {
    imgproc::put_text(frame, text, origin, FONT_HERSHEY_SIMPLEX, 0.6, white(), 2, LINE_8, false)?;
    Ok(())
}

fn draw_skeleton(frame: &mut Mat, pose: &[PoseLandmark], visibility_threshold: f32) -> Result<()> {
    if pose.is_empty() {
        return Ok(());
    }

    let (width, height) = (frame.cols(), frame.rows());
    #[allow(clippy::cast_precision_loss)]
    let to_pixel = |lm: &PoseLandmark| {
        Point::new(
            f32_to_i32_clamp(lm.x * width as f32, 0, width - 1),
            f32_to_i32_clamp(lm.y * height as f32, 0, height - 1),
        )
    };
    let visible = |lm: &PoseLandmark| lm.visibility >= visibility_threshold;

    for &(a, b) in &POSE_CONNECTIONS {
        let (Some(start), Some(end)) = (pose.get(a), pose.get(b)) else {
            continue;
        };
        if visible(start) && visible(end) {
            imgproc::line(frame, to_pixel(start), to_pixel(end), white(), 2, LINE_8, 0)?;
        }
    }

    for landmark in pose.iter().filter(|lm| visible(*lm)) {
        imgproc::circle(frame, to_pixel(landmark), 3, red(), -1, LINE_8, 0)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::Boundary;
    use opencv::core::{Vec3b, CV_8UC3};

    fn result(status: BoxStatus, passed: bool) -> FrameResult {
        FrameResult {
            frame_index: 1,
            bbox: Some(Boundary::new(20, 20, 80, 60)),
            box_status: status,
            init_progress: 12,
            brightness: 120.0,
            lighting_ok: true,
            bbox_in_frame: true,
            visible_landmarks: 33,
            frame_passed: passed,
        }
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(&result(BoxStatus::Initializing, false), 30), "INITIALIZING (12/30)");
        assert_eq!(status_text(&result(BoxStatus::Stable, true), 30), "PASS");
        assert_eq!(status_text(&result(BoxStatus::InitializationFailed, false), 30), "FAIL");
    }

    #[test]
    fn test_expansion_is_yellow_even_when_passing() {
        assert_eq!(boundary_color(&result(BoxStatus::StretchedAndExpanded, true)), yellow());
        assert_eq!(boundary_color(&result(BoxStatus::Stable, true)), green());
        assert_eq!(boundary_color(&result(BoxStatus::NoLandmarks, false)), red());
    }

    #[test]
    fn test_hud_hides_pass_rate_during_warmup() {
        let hud = SessionHud {
            frame_index: 5,
            total_frames: Some(100),
            timestamp: 0.1666,
            pass_rate: None,
        };
        assert_eq!(hud.lines(), vec!["Frame: 5/100".to_string(), "Time: 0.2s".to_string()]);

        let hud = SessionHud {
            pass_rate: Some(0.875),
            total_frames: None,
            ..hud
        };
        assert_eq!(hud.lines()[0], "Frame: 5");
        assert_eq!(hud.lines()[2], "Pass Rate: 87.5%");
    }

    #[test]
    fn test_draw_overlay_marks_boundary_and_keeps_input() {
        let frame = Mat::new_rows_cols_with_default(120, 320, CV_8UC3, Scalar::all(0.0)).unwrap();
        let pose = vec![PoseLandmark::new(0.5, 0.5, 0.9); 33];

        let overlay = draw_overlay(&frame, &result(BoxStatus::Stable, true), &pose, 0.5, 30).unwrap();

        // Right edge of the boundary, between the headline and the detail lines
        let pixel = overlay.at_2d::<Vec3b>(50, 80).unwrap();
        assert_eq!([pixel[0], pixel[1], pixel[2]], [0, 255, 0]);
        let original = frame.at_2d::<Vec3b>(50, 80).unwrap();
        assert_eq!([original[0], original[1], original[2]], [0, 0, 0]);
    }

    #[test]
    fn test_draw_session_hud_on_small_frame() {
        let mut frame = Mat::new_rows_cols_with_default(100, 400, CV_8UC3, Scalar::all(0.0)).unwrap();
        let hud = SessionHud {
            frame_index: 40,
            total_frames: Some(40),
            timestamp: 1.3,
            pass_rate: Some(1.0),
        };
        assert!(draw_session_hud(&mut frame, &hud).is_ok());
    }
}
