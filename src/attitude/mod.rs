//! Attitude of bodies from a time-ordered sample series
//!
//! An [`AttitudeServer`] owns an immutable, date-sorted set of orientation
//! samples. Queries between two samples interpolate along the shortest great
//! arc; queries outside the covered range return the nearest boundary
//! sample, so a running simulation clock always gets an orientation.

use crate::framelib::Frame;
use crate::time::{bracket, keep_last_per_date, Bracket, JulianDate};
use log::{debug, warn};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Below this `1 - |cos θ|` interpolation falls back to a normalised lerp
const SLERP_LINEAR_THRESHOLD: f64 = 1e-6;

/// Smallest quaternion norm accepted by [`AttitudeServer::from_raw`]
const MIN_QUATERNION_NORM: f64 = 1e-12;

/// Error type for attitude series construction
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttitudeError {
    #[error("Attitude series has no samples")]
    EmptySeries,

    #[error("Attitude sample {index} has a non-finite date")]
    NonFiniteDate { index: usize },

    #[error("Attitude sample {index} is not a valid rotation")]
    DegenerateQuaternion { index: usize },
}

/// Result type for attitude operations
pub type Result<T> = std::result::Result<T, AttitudeError>;

/// Orientation of a body at one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttitudeSample {
    pub date: JulianDate,
    pub orientation: UnitQuaternion<f64>,
}

impl AttitudeSample {
    pub fn new(date: JulianDate, orientation: UnitQuaternion<f64>) -> Self {
        AttitudeSample { date, orientation }
    }
}

/// Orientation and angular velocity at a queried date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttitudeState {
    pub orientation: UnitQuaternion<f64>,
    /// Rotation rate in radians per day
    pub angular_velocity: Vector3<f64>,
}

impl AttitudeState {
    /// The same rotation expressed in coordinates rotated by `rotation`
    ///
    /// The orientation is conjugated, so its rotation angle is unchanged,
    /// and the angular velocity vector is rotated.
    pub fn rotated(&self, rotation: &UnitQuaternion<f64>) -> AttitudeState {
        AttitudeState {
            orientation: rotation * self.orientation * rotation.inverse(),
            angular_velocity: rotation * self.angular_velocity,
        }
    }
}

/// Read-only attitude history of one body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttitudeServer {
    frame: Frame,
    samples: Vec<AttitudeSample>,
}

impl AttitudeServer {
    /// Build a server from samples in any order
    ///
    /// Samples are stably sorted by date and their quaternions renormalised.
    /// When several samples share a date only the last one is kept. The
    /// samples are taken to be in J2000 equatorial coordinates, see
    /// [`AttitudeServer::with_frame`].
    pub fn new(mut samples: Vec<AttitudeSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(AttitudeError::EmptySeries);
        }
        if let Some(index) = samples.iter().position(|s| !s.date.jd().is_finite()) {
            return Err(AttitudeError::NonFiniteDate { index });
        }

        let sorted = samples.windows(2).all(|w| w[0].date <= w[1].date);
        if !sorted {
            debug!("Sorting {} attitude samples by date", samples.len());
            samples.sort_by(|a, b| a.date.jd().total_cmp(&b.date.jd()));
        }

        let duplicates = keep_last_per_date(&mut samples, |s| s.date);
        if duplicates > 0 {
            warn!(
                "Attitude series had {} duplicated dates; kept the last sample of each",
                duplicates
            );
        }

        for sample in samples.iter_mut() {
            sample.orientation = UnitQuaternion::new_normalize(sample.orientation.into_inner());
        }

        let server = AttitudeServer {
            frame: Frame::EquatorialJ2000,
            samples,
        };
        let (start, end) = server.coverage();
        debug!(
            "Attitude server with {} samples covering {} to {}",
            server.len(),
            start,
            end
        );
        Ok(server)
    }

    /// Build a server from `(julian date, [w, x, y, z])` rows
    pub fn from_raw(rows: &[(f64, [f64; 4])]) -> Result<Self> {
        let samples = rows
            .iter()
            .enumerate()
            .map(|(index, &(jd, [w, x, y, z]))| {
                let date =
                    JulianDate::try_new(jd).map_err(|_| AttitudeError::NonFiniteDate { index })?;
                let q = Quaternion::new(w, x, y, z);
                let norm = q.norm();
                if !norm.is_finite() || norm < MIN_QUATERNION_NORM {
                    return Err(AttitudeError::DegenerateQuaternion { index });
                }
                Ok(AttitudeSample::new(date, UnitQuaternion::from_quaternion(q)))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(samples)
    }

    /// Declare the frame the sample orientations are expressed in
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Orientation at `date`
    pub fn attitude_at(&self, date: JulianDate) -> UnitQuaternion<f64> {
        match self.bracket(date) {
            Bracket::Before => self.first().orientation,
            Bracket::After => self.last().orientation,
            Bracket::Exact(i) => self.samples[i].orientation,
            Bracket::Between(i) => {
                let (a, b) = (&self.samples[i], &self.samples[i + 1]);
                let alpha = (date - a.date) / (b.date - a.date);
                slerp(&a.orientation, &b.orientation, alpha)
            }
        }
    }

    /// Orientation and angular velocity at `date`
    ///
    /// The angular velocity is the constant rate of the bracketing pair of
    /// samples, and zero outside the covered range. Both are in
    /// [`AttitudeServer::frame`].
    pub fn state_at(&self, date: JulianDate) -> AttitudeState {
        let orientation = self.attitude_at(date);
        let pair = match self.bracket(date) {
            Bracket::Before | Bracket::After => None,
            Bracket::Between(i) => Some(i),
            Bracket::Exact(i) if i + 1 < self.samples.len() => Some(i),
            Bracket::Exact(i) => i.checked_sub(1),
        };

        let angular_velocity = pair
            .map(|i| angular_velocity(&self.samples[i], &self.samples[i + 1]))
            .unwrap_or_else(Vector3::zeros);

        AttitudeState {
            orientation,
            angular_velocity,
        }
    }

    /// First and last sample dates
    pub fn coverage(&self) -> (JulianDate, JulianDate) {
        (self.first().date, self.last().date)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; an empty server cannot be built
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[AttitudeSample] {
        &self.samples
    }

    fn first(&self) -> &AttitudeSample {
        &self.samples[0]
    }

    fn last(&self) -> &AttitudeSample {
        &self.samples[self.samples.len() - 1]
    }

    fn bracket(&self, date: JulianDate) -> Bracket {
        bracket(&self.samples, date, |s| s.date)
    }
}

/// Shortest-path spherical interpolation, `alpha` in [0, 1]
pub fn slerp(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>, alpha: f64) -> UnitQuaternion<f64> {
    let qa = a.quaternion();
    let mut qb = *b.quaternion();
    let mut dot = qa.coords.dot(&qb.coords);
    if dot < 0.0 {
        qb = -qb;
        dot = -dot;
    }

    let (scale_a, scale_b) = if 1.0 - dot > SLERP_LINEAR_THRESHOLD {
        let angle = dot.min(1.0).acos();
        let inv_sin = 1.0 / angle.sin();
        (
            ((1.0 - alpha) * angle).sin() * inv_sin,
            (alpha * angle).sin() * inv_sin,
        )
    } else {
        (1.0 - alpha, alpha)
    };

    UnitQuaternion::new_normalize(*qa * scale_a + qb * scale_b)
}

fn angular_velocity(a: &AttitudeSample, b: &AttitudeSample) -> Vector3<f64> {
    let dt = b.date - a.date;
    if dt <= 0.0 {
        return Vector3::zeros();
    }
    let delta = b.orientation * a.orientation.inverse();
    delta.scaled_axis() / dt
}
