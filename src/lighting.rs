//! Frame brightness check.

use crate::{
    constants::{DEFAULT_MAX_BRIGHTNESS, DEFAULT_MIN_BRIGHTNESS},
    Error, Result,
};
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};
use serde::Serialize;

/// Mean grayscale brightness of a frame and whether it is acceptable
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LightingReading {
    /// Mean intensity on a 0-255 scale
    pub brightness: f64,
    /// True when brightness is within the configured bounds
    pub ok: bool,
}

/// Inclusive brightness window a frame must fall in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingCheck {
    min_brightness: f64,
    max_brightness: f64,
}

impl Default for LightingCheck {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_BRIGHTNESS, DEFAULT_MAX_BRIGHTNESS)
    }
}

impl LightingCheck {
    #[must_use]
    pub fn new(min_brightness: f64, max_brightness: f64) -> Self {
        Self {
            min_brightness,
            max_brightness,
        }
    }

    /// Whether a brightness value lies within `[min, max]`
    #[must_use]
    pub fn is_acceptable(&self, brightness: f64) -> bool {
        (self.min_brightness..=self.max_brightness).contains(&brightness)
    }

    /// Measure a frame and judge it
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is empty or has an unsupported channel count.
    pub fn check(&self, frame: &Mat) -> Result<LightingReading> {
        let brightness = mean_brightness(frame)?;
        Ok(LightingReading {
            brightness,
            ok: self.is_acceptable(brightness),
        })
    }
}

/// Mean grayscale intensity of a BGR, BGRA or single-channel 8-bit frame
///
/// # Errors
///
/// Returns an error if the frame is empty, has an unsupported channel count,
/// or the color conversion fails.
pub fn mean_brightness(frame: &Mat) -> Result<f64> {
    if frame.empty() {
        return Err(Error::InvalidInput("Cannot measure brightness of an empty frame".to_string()));
    }

    let gray = match frame.channels() {
        1 => frame.clone(),
        3 => {
            let mut gray = Mat::default();
            imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;
            gray
        }
        4 => {
            let mut gray = Mat::default();
            imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGRA2GRAY, 0)?;
            gray
        }
        n => {
            return Err(Error::InvalidInput(format!(
                "Unsupported channel count for brightness: {n}"
            )))
        }
    };

    let mean = core::mean(&gray, &Mat::default())?;
    Ok(mean[0])
}
