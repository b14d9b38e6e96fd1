//! Main application module for validating baby monitoring video.

use crate::{
    config::Config,
    constants::{MAX_CONSECUTIVE_READ_FAILURES, READ_RETRY_DELAY_MS},
    detection::LandmarkDetector,
    error::{Error, Result},
    landmarks::Detections,
    overlay::{self, SessionHud},
    report::SessionReport,
    validator::{FrameResult, FrameValidator},
};
use log::{info, warn};
use opencv::{
    core::Mat,
    highgui::{self, WINDOW_NORMAL},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT},
};
use std::{thread, time::Duration};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Camera index or video file path
    pub video_source: VideoSource,
    /// Validator settings
    pub config: Config,
    /// Print one JSON object per validated frame on stdout
    pub json_lines: bool,
}

/// Video source type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// Webcam index
    Camera(i32),
    /// Video file path
    File(String),
}

/// Frame-by-frame validation paired with its running report.
///
/// Holds no video or model handles, so it can be driven directly with
/// decoded frames and detector output.
pub struct ValidationSession {
    validator: FrameValidator,
    report: SessionReport,
}

impl ValidationSession {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            validator: FrameValidator::new(config),
            report: SessionReport::new(
                config.tracker.initialization_frames,
                config.validation.pass_rate_threshold,
            ),
        }
    }

    /// Validate one frame and count it toward the report
    ///
    /// # Errors
    ///
    /// Returns an error if the frame brightness cannot be measured.
    pub fn step(&mut self, frame: &Mat, detections: &Detections) -> Result<FrameResult> {
        let result = self.validator.validate(frame, detections)?;
        self.report.record(&result);
        Ok(result)
    }

    /// Counters for the on-screen display after `result`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hud(&self, result: &FrameResult, total_frames: Option<u64>, fps: f64) -> SessionHud {
        SessionHud {
            frame_index: result.frame_index,
            total_frames,
            timestamp: if fps > 0.0 { result.frame_index as f64 / fps } else { 0.0 },
            pass_rate: self.report.running_pass_rate(),
        }
    }

    #[must_use]
    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    #[must_use]
    pub fn validator(&self) -> &FrameValidator {
        &self.validator
    }

    #[must_use]
    pub fn into_report(self) -> SessionReport {
        self.report
    }
}

/// Counts back-to-back failed reads from a live source
#[derive(Debug, Clone, Copy)]
struct ReadFailures {
    consecutive: u32,
    limit: u32,
}

impl ReadFailures {
    fn new(limit: u32) -> Self {
        Self { consecutive: 0, limit }
    }

    /// Record a failed read; true once the limit is reached
    fn record(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive >= self.limit
    }

    fn reset(&mut self) {
        self.consecutive = 0;
    }
}

/// Main application struct
pub struct ValidatorApp {
    settings: AppConfig,
    detector: Box<dyn LandmarkDetector>,
    session: ValidationSession,
    video_capture: VideoCapture,
    total_frames: Option<u64>,
    fps: f64,
    paused: bool,
}

impl ValidatorApp {
    /// Open the video source and prepare a fresh session
    ///
    /// # Errors
    ///
    /// Returns `VideoSource` if the camera or file cannot be opened, or an
    /// `OpenCV` error if the display window cannot be created.
    pub fn new(settings: AppConfig, detector: Box<dyn LandmarkDetector>) -> Result<Self> {
        info!("Initializing baby position validator");

        let video_capture = match &settings.video_source {
            VideoSource::Camera(index) => {
                info!("Opening camera {index}");
                let mut cap = VideoCapture::new(*index, videoio::CAP_ANY)?;
                if cap.is_opened()? {
                    cap.set(CAP_PROP_BUFFERSIZE, 1.0)?;
                }
                cap
            }
            VideoSource::File(path) => {
                info!("Opening video file: {path}");
                VideoCapture::from_file(path, videoio::CAP_ANY)?
            }
        };

        if !video_capture.is_opened()? {
            return Err(Error::VideoSource(format!("Could not open {:?}", settings.video_source)));
        }

        let fps = video_capture.get(CAP_PROP_FPS)?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let total_frames = match settings.video_source {
            VideoSource::File(_) => {
                let count = video_capture.get(CAP_PROP_FRAME_COUNT)?;
                (count > 0.0).then_some(count as u64)
            }
            VideoSource::Camera(_) => None,
        };
        info!("Video source at {fps:.1} FPS, {total_frames:?} frames");

        if settings.config.display.show_window {
            highgui::named_window(&settings.config.display.window_name, WINDOW_NORMAL)?;
        }

        Ok(Self {
            session: ValidationSession::new(&settings.config),
            settings,
            detector,
            video_capture,
            total_frames,
            fps,
            paused: false,
        })
    }

    /// Run until the video ends or the user quits, returning the final report
    ///
    /// # Errors
    ///
    /// Returns an error if reading, validating or displaying a frame fails.
    pub fn run(mut self) -> Result<SessionReport> {
        let show_window = self.settings.config.display.show_window;
        let wait_ms = match self.settings.video_source {
            VideoSource::File(_) => self.settings.config.display.file_wait_ms,
            VideoSource::Camera(_) => self.settings.config.display.camera_wait_ms,
        };

        if show_window {
            info!("Press 'q' to quit, 'p' to pause");
        }
        info!(
            "Boundary will initialize over the first {} frames",
            self.settings.config.tracker.initialization_frames
        );

        let mut read_failures = ReadFailures::new(MAX_CONSECUTIVE_READ_FAILURES);

        loop {
            if !self.paused {
                let mut frame = Mat::default();
                if !self.video_capture.read(&mut frame)? || frame.empty() {
                    if matches!(self.settings.video_source, VideoSource::File(_)) {
                        info!("End of video file reached");
                        break;
                    }
                    if read_failures.record() {
                        warn!("Camera returned no frames {MAX_CONSECUTIVE_READ_FAILURES} times in a row, stopping");
                        break;
                    }
                    warn!("Failed to read frame, retrying...");
                    thread::sleep(Duration::from_millis(READ_RETRY_DELAY_MS));
                    continue;
                }
                read_failures.reset();

                let (result, detections) = self.process_frame(&frame)?;

                if show_window {
                    self.display_results(&frame, &result, &detections)?;
                }
            }

            if show_window {
                let key = highgui::wait_key(wait_ms)? & 0xFF;
                if key == 27 || key == i32::from(b'q') {
                    info!("Exit requested by user");
                    break;
                }
                if key == i32::from(b'p') {
                    self.paused = !self.paused;
                    info!("{}", if self.paused { "Paused" } else { "Resumed" });
                }
            }
        }

        if show_window {
            highgui::destroy_all_windows()?;
        }

        info!("Validation finished after {} frames", self.session.report().total_frames());
        Ok(self.session.into_report())
    }

    /// Detect, validate and optionally emit one frame
    fn process_frame(&mut self, frame: &Mat) -> Result<(FrameResult, Detections)> {
        let detections = match self.detector.detect(frame) {
            Ok(detections) => detections,
            Err(e) => {
                warn!("Landmark detection failed: {e}");
                Detections::default()
            }
        };

        let result = self.session.step(frame, &detections)?;

        if self.settings.json_lines {
            let line = serde_json::to_string(&result)
                .map_err(|e| Error::InvalidInput(format!("Failed to serialize frame result: {e}")))?;
            println!("{line}");
        }

        Ok((result, detections))
    }

    fn display_results(&self, frame: &Mat, result: &FrameResult, detections: &Detections) -> Result<()> {
        let config = &self.settings.config;
        let mut display_frame = overlay::draw_overlay(
            frame,
            result,
            &detections.pose,
            config.validation.visibility_threshold,
            config.tracker.initialization_frames,
        )?;

        let hud = self.session.hud(result, self.total_frames, self.fps);
        overlay::draw_session_hud(&mut display_frame, &hud)?;

        highgui::imshow(&config.display.window_name, &display_frame)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary_tracker::BoxStatus;
    use crate::landmarks::PoseLandmark;
    use opencv::core::{Scalar, CV_8UC3};

    fn gray_frame(value: f64) -> Mat {
        Mat::new_rows_cols_with_default(400, 400, CV_8UC3, Scalar::all(value)).unwrap()
    }

    fn full_body() -> Detections {
        let pose = (0..33)
            .map(|i| PoseLandmark::new(0.3 + 0.01 * i as f32, 0.5, 0.9))
            .collect();
        Detections::from_pose(pose)
    }

    #[test]
    fn test_session_counts_every_frame() {
        let mut config = Config::default();
        config.tracker.initialization_frames = 2;
        config.tracker.min_history_points = 1;
        let mut session = ValidationSession::new(&config);

        let frame = gray_frame(120.0);
        for _ in 0..4 {
            session.step(&frame, &full_body()).unwrap();
        }

        let report = session.report();
        assert_eq!(report.total_frames(), 4);
        assert_eq!(report.valid_frames(), 2);
        assert_eq!(session.validator().tracker().frame_count(), 4);
    }

    #[test]
    fn test_dark_frames_fail_after_warmup() {
        let mut config = Config::default();
        config.tracker.initialization_frames = 1;
        config.tracker.min_history_points = 1;
        let mut session = ValidationSession::new(&config);

        let frame = gray_frame(10.0);
        session.step(&frame, &full_body()).unwrap();
        let result = session.step(&frame, &full_body()).unwrap();

        assert_eq!(result.box_status, BoxStatus::BoundaryEstablished);
        assert!(!result.lighting_ok);
        assert!(!result.frame_passed);
    }

    #[test]
    fn test_hud_timestamp_and_pass_rate() {
        let mut config = Config::default();
        config.tracker.initialization_frames = 1;
        config.tracker.min_history_points = 1;
        let mut session = ValidationSession::new(&config);

        let frame = gray_frame(120.0);
        let first = session.step(&frame, &full_body()).unwrap();
        let hud = session.hud(&first, Some(60), 30.0);
        assert_eq!(hud.pass_rate, None);

        let second = session.step(&frame, &full_body()).unwrap();
        let hud = session.hud(&second, Some(60), 30.0);
        assert!((hud.timestamp - 2.0 / 30.0).abs() < 1e-9);
        assert_eq!(hud.pass_rate, Some(1.0));

        assert_eq!(session.hud(&second, None, 0.0).timestamp, 0.0);
    }

    #[test]
    fn test_read_failures_give_up_only_when_consecutive() {
        let mut failures = ReadFailures::new(3);
        assert!(!failures.record());
        assert!(!failures.record());
        failures.reset();

        assert!(!failures.record());
        assert!(!failures.record());
        assert!(failures.record());
    }

    #[test]
    fn test_missing_video_file() {
        let settings = AppConfig {
            video_source: VideoSource::File("/nonexistent/baby.mp4".to_string()),
            config: Config::default(),
            json_lines: false,
        };
        let detector = Box::new(crate::detection::ScriptedDetector::default());

        assert!(ValidatorApp::new(settings, detector).is_err());
    }
}
