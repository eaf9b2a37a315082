//! Resolver configuration and the process-wide accuracy switch
//!
//! The accuracy switch is the only shared mutable value in the crate. It is
//! written rarely (a quality preset change) and read once at the start of a
//! resolve pass through [`ResolverConfig::with_global_accuracy`]; evaluation
//! itself only ever sees the snapshot.

use crate::constants::{LOW_ACCURACY_SKIP, VELOCITY_STEP_DAYS};
use crate::framelib::{Frame, FrameError};
use crate::series::SeriesEvaluator;
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

pub use crate::series::AccuracyMode;

static GLOBAL_LOW_ACCURACY: AtomicBool = AtomicBool::new(false);

/// Set the process-wide accuracy mode
pub fn set_global_accuracy(mode: AccuracyMode) {
    GLOBAL_LOW_ACCURACY.store(mode == AccuracyMode::Low, Ordering::Release);
}

/// Current process-wide accuracy mode
pub fn global_accuracy() -> AccuracyMode {
    if GLOBAL_LOW_ACCURACY.load(Ordering::Acquire) {
        AccuracyMode::Low
    } else {
        AccuracyMode::High
    }
}

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse resolver configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unusable working frame: {0}")]
    WorkingFrame(#[from] FrameError),
}

/// Settings of a [`PositionAttitudeResolver`](crate::resolver::PositionAttitudeResolver)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Series accuracy for the pass
    pub accuracy: AccuracyMode,
    /// Fraction of each series bucket skipped in low accuracy mode
    pub low_accuracy_skip: f64,
    /// Frame all resolved vectors are expressed in
    pub working_frame: Frame,
    /// Half-width of the central difference for series velocities, in days
    pub velocity_step_days: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            accuracy: AccuracyMode::High,
            low_accuracy_skip: LOW_ACCURACY_SKIP,
            working_frame: Frame::Render,
            velocity_step_days: VELOCITY_STEP_DAYS,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ResolverConfig = serde_json::from_str(json)?;
        let config = config.validated();
        config.validate()?;
        Ok(config)
    }

    /// Check the settings that cannot be repaired, currently the working frame
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.working_frame.validate()?;
        Ok(())
    }

    pub fn with_accuracy(mut self, accuracy: AccuracyMode) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Snapshot the process-wide accuracy switch
    pub fn with_global_accuracy(self) -> Self {
        self.with_accuracy(global_accuracy())
    }

    pub fn with_low_accuracy_skip(mut self, fraction: f64) -> Self {
        self.low_accuracy_skip = fraction;
        self.validated()
    }

    pub fn with_working_frame(mut self, frame: Frame) -> Self {
        self.working_frame = frame;
        self
    }

    pub fn with_velocity_step_days(mut self, days: f64) -> Self {
        self.velocity_step_days = days;
        self.validated()
    }

    /// Series evaluator matching this configuration
    pub fn evaluator(&self) -> SeriesEvaluator {
        SeriesEvaluator::new(self.accuracy).with_low_accuracy_skip(self.low_accuracy_skip)
    }

    fn validated(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.low_accuracy_skip) {
            let fixed = if self.low_accuracy_skip.is_nan() {
                LOW_ACCURACY_SKIP
            } else {
                self.low_accuracy_skip.clamp(0.0, 1.0)
            };
            warn!(
                "low_accuracy_skip {} out of range, using {}",
                self.low_accuracy_skip, fixed
            );
            self.low_accuracy_skip = fixed;
        }
        if !(self.velocity_step_days.is_finite() && self.velocity_step_days > 0.0) {
            warn!(
                "velocity_step_days {} must be positive, using {}",
                self.velocity_step_days, VELOCITY_STEP_DAYS
            );
            self.velocity_step_days = VELOCITY_STEP_DAYS;
        }
        self
    }
}
