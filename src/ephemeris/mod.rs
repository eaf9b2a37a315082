//! Stored ephemeris tables
//!
//! A precomputed, date-sorted table of positions for one body, queried with
//! linear interpolation. Dates outside the table clamp to the nearest row.

use crate::framelib::Frame;
use crate::time::{bracket, keep_last_per_date, Bracket, JulianDate};
use log::{debug, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for ephemeris tables
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("Ephemeris table has no samples")]
    EmptySeries,

    #[error("Ephemeris sample {index} has a non-finite date")]
    NonFiniteDate { index: usize },

    #[error("Ephemeris sample {index} has a non-finite position")]
    NonFinitePosition { index: usize },
}

/// Result type for ephemeris operations
pub type Result<T> = std::result::Result<T, EphemerisError>;

/// One row of an ephemeris table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EphemerisSample {
    pub date: JulianDate,
    pub position: Vector3<f64>,
}

impl EphemerisSample {
    pub fn new(date: JulianDate, position: Vector3<f64>) -> Self {
        EphemerisSample { date, position }
    }
}

/// Position table of one body in a fixed frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ephemeris {
    frame: Frame,
    samples: Vec<EphemerisSample>,
}

impl Ephemeris {
    pub fn new(frame: Frame, mut samples: Vec<EphemerisSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(EphemerisError::EmptySeries);
        }
        if let Some(index) = samples.iter().position(|s| !s.date.jd().is_finite()) {
            return Err(EphemerisError::NonFiniteDate { index });
        }
        if let Some(index) = samples
            .iter()
            .position(|s| !s.position.iter().all(|c| c.is_finite()))
        {
            return Err(EphemerisError::NonFinitePosition { index });
        }

        if !samples.windows(2).all(|w| w[0].date <= w[1].date) {
            debug!("Sorting {} ephemeris samples by date", samples.len());
            samples.sort_by(|a, b| a.date.jd().total_cmp(&b.date.jd()));
        }
        let duplicates = keep_last_per_date(&mut samples, |s| s.date);
        if duplicates > 0 {
            warn!(
                "Ephemeris table had {} duplicated dates; kept the last row of each",
                duplicates
            );
        }

        debug!(
            "Ephemeris with {} samples in {} frame",
            samples.len(),
            frame
        );
        Ok(Ephemeris { frame, samples })
    }

    /// Frame the stored positions are expressed in
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Interpolated position at `date`
    pub fn position_at(&self, date: JulianDate) -> Vector3<f64> {
        match bracket(&self.samples, date, |s| s.date) {
            Bracket::Before => self.samples[0].position,
            Bracket::After => self.samples[self.samples.len() - 1].position,
            Bracket::Exact(i) => self.samples[i].position,
            Bracket::Between(i) => {
                let (a, b) = (&self.samples[i], &self.samples[i + 1]);
                let alpha = (date - a.date) / (b.date - a.date);
                a.position.lerp(&b.position, alpha)
            }
        }
    }

    /// Velocity per day of the bracketing rows; zero outside the table
    pub fn velocity_at(&self, date: JulianDate) -> Vector3<f64> {
        let n = self.samples.len();
        let pair = match bracket(&self.samples, date, |s| s.date) {
            Bracket::Before | Bracket::After => None,
            Bracket::Between(i) => Some(i),
            Bracket::Exact(i) if i + 1 < n => Some(i),
            Bracket::Exact(i) => i.checked_sub(1),
        };

        match pair {
            Some(i) => {
                let (a, b) = (&self.samples[i], &self.samples[i + 1]);
                let dt = b.date - a.date;
                if dt > 0.0 {
                    (b.position - a.position) / dt
                } else {
                    Vector3::zeros()
                }
            }
            None => Vector3::zeros(),
        }
    }

    pub fn coverage(&self) -> (JulianDate, JulianDate) {
        (self.samples[0].date, self.samples[self.samples.len() - 1].date)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[EphemerisSample] {
        &self.samples
    }
}
