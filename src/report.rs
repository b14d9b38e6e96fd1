//! Session-level aggregation of per-frame results.

use crate::{constants::DEFAULT_PASS_RATE_THRESHOLD, validator::FrameResult};
use serde::Serialize;
use std::fmt;

/// Overall verdict for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("PASS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

/// Running tally of a validation session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    initialization_frames: u32,
    pass_rate_threshold: f64,
    total_frames: u64,
    passed_frames: u64,
}

impl Default for SessionReport {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_INITIALIZATION_FRAMES, DEFAULT_PASS_RATE_THRESHOLD)
    }
}

impl SessionReport {
    #[must_use]
    pub fn new(initialization_frames: u32, pass_rate_threshold: f64) -> Self {
        Self {
            initialization_frames,
            pass_rate_threshold,
            total_frames: 0,
            passed_frames: 0,
        }
    }

    /// Count one validated frame
    pub fn record(&mut self, result: &FrameResult) {
        self.record_outcome(result.frame_passed);
    }

    /// Count one frame by outcome alone
    pub fn record_outcome(&mut self, passed: bool) {
        self.total_frames += 1;
        if passed {
            self.passed_frames += 1;
        }
    }

    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    #[must_use]
    pub fn passed_frames(&self) -> u64 {
        self.passed_frames
    }

    #[must_use]
    pub fn initialization_frames(&self) -> u32 {
        self.initialization_frames
    }

    /// Frames after warm-up; negative when the session ended during warm-up
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn valid_frames(&self) -> i64 {
        self.total_frames as i64 - i64::from(self.initialization_frames)
    }

    /// Passed frames over valid frames, or 0 when there are no valid frames
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pass_rate(&self) -> f64 {
        let valid = self.valid_frames();
        if valid > 0 {
            self.passed_frames as f64 / valid as f64
        } else {
            0.0
        }
    }

    /// Pass rate so far, only once warm-up is over
    #[must_use]
    pub fn running_pass_rate(&self) -> Option<f64> {
        (self.valid_frames() > 0).then(|| self.pass_rate())
    }

    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.pass_rate() >= self.pass_rate_threshold {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    /// Snapshot suitable for JSON output
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            total_frames: self.total_frames,
            initialization_frames: self.initialization_frames,
            valid_frames: self.valid_frames(),
            passed_frames: self.passed_frames,
            pass_rate: self.pass_rate(),
            verdict: self.verdict(),
        }
    }
}

/// Serializable form of the final report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_frames: u64,
    pub initialization_frames: u32,
    pub valid_frames: i64,
    pub passed_frames: u64,
    pub pass_rate: f64,
    pub verdict: Verdict,
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- FINAL REPORT ---")?;
        writeln!(f, "Total frames: {}", self.total_frames)?;
        writeln!(f, "Initialization frames: {}", self.initialization_frames)?;
        writeln!(f, "Valid frames: {}", self.valid_frames())?;
        writeln!(f, "Passed frames: {}", self.passed_frames)?;
        writeln!(f, "Pass rate: {:.1}%", self.pass_rate() * 100.0)?;
        write!(f, "Result: {}", self.verdict())
    }
}
