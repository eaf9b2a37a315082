//! Position and attitude resolution, the composition root
//!
//! A [`BodyDescriptor`] names where a body's position comes from (an
//! analytical series, a stored ephemeris or a fixed point) and optionally
//! carries an attitude history. The resolver turns a descriptor, a time and a
//! camera position into vectors in the working frame plus a rank key.
//! Resolution is a pure function of its inputs.

use crate::attitude::{AttitudeServer, AttitudeState};
use crate::config::ResolverConfig;
use crate::ephemeris::Ephemeris;
use crate::framelib::{Frame, FrameError};
use crate::ranking::Positioned;
use crate::series::{OrbitalSeries, SeriesEvaluator};
use crate::time::JulianDate;
use log::warn;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Error type for a single body resolution
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Frame conversion failed for {body}: {source}")]
    Frame {
        body: String,
        #[source]
        source: FrameError,
    },

    #[error("Resolved state of {body} is not finite")]
    NonFinite { body: String },
}

/// Result type for resolution
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Position source of a body
#[derive(Debug, Clone)]
pub enum PositionSource {
    /// Analytical series evaluated at the simulation time
    Series(Arc<OrbitalSeries>),
    /// Precomputed table interpolated at the simulation time
    Ephemeris(Arc<Ephemeris>),
    /// Constant position in a frame
    Fixed { position: Vector3<f64>, frame: Frame },
}

/// Everything the resolver needs to know about one body
#[derive(Debug, Clone)]
pub struct BodyDescriptor {
    pub name: String,
    pub source: PositionSource,
    pub attitude: Option<Arc<AttitudeServer>>,
}

impl BodyDescriptor {
    pub fn new(name: impl Into<String>, source: PositionSource) -> Self {
        BodyDescriptor {
            name: name.into(),
            source,
            attitude: None,
        }
    }

    pub fn series(name: impl Into<String>, series: Arc<OrbitalSeries>) -> Self {
        Self::new(name, PositionSource::Series(series))
    }

    pub fn ephemeris(name: impl Into<String>, ephemeris: Arc<Ephemeris>) -> Self {
        Self::new(name, PositionSource::Ephemeris(ephemeris))
    }

    pub fn fixed(name: impl Into<String>, position: Vector3<f64>, frame: Frame) -> Self {
        Self::new(name, PositionSource::Fixed { position, frame })
    }

    pub fn with_attitude(mut self, attitude: Arc<AttitudeServer>) -> Self {
        self.attitude = Some(attitude);
        self
    }
}

/// Position and velocity (per day) in a named frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionedVelocity {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub frame: Frame,
}

impl PositionedVelocity {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>, frame: Frame) -> Self {
        PositionedVelocity {
            position,
            velocity,
            frame,
        }
    }

    fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|c| c.is_finite())
    }
}

impl Positioned for PositionedVelocity {
    fn position(&self) -> Vector3<f64> {
        self.position
    }
}

/// Output of one resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBody {
    pub name: String,
    pub state: PositionedVelocity,
    /// Attitude rotated into the working frame
    pub attitude: Option<AttitudeState>,
    /// Distance to the camera in the working frame
    pub rank_key: f64,
}

impl Positioned for ResolvedBody {
    fn position(&self) -> Vector3<f64> {
        self.state.position
    }

    fn distance_to(&self, camera: &Vector3<f64>) -> f64 {
        (self.state.position - camera).norm()
    }
}

/// Resolves bodies into the working frame
#[derive(Debug, Clone)]
pub struct PositionAttitudeResolver {
    config: ResolverConfig,
    evaluator: SeriesEvaluator,
}

impl PositionAttitudeResolver {
    pub fn new(config: ResolverConfig) -> Self {
        if let Err(e) = config.working_frame.validate() {
            warn!(
                "Working frame {} is unusable, every resolve will fail: {}",
                config.working_frame, e
            );
        }
        PositionAttitudeResolver {
            evaluator: config.evaluator(),
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn working_frame(&self) -> Frame {
        self.config.working_frame
    }

    /// Resolve one body at `time` against a camera in the working frame
    pub fn resolve(
        &self,
        body: &BodyDescriptor,
        time: JulianDate,
        camera: &Vector3<f64>,
    ) -> Result<ResolvedBody> {
        let raw = match &body.source {
            PositionSource::Series(series) => self.series_state(series, time),
            PositionSource::Ephemeris(table) => PositionedVelocity::new(
                table.position_at(time),
                table.velocity_at(time),
                table.frame(),
            ),
            PositionSource::Fixed { position, frame } => {
                PositionedVelocity::new(*position, Vector3::zeros(), *frame)
            }
        };

        let frame_error = |source| ResolveError::Frame {
            body: body.name.clone(),
            source,
        };
        let state = self.convert(&raw).map_err(frame_error)?;
        if !state.is_finite() {
            return Err(ResolveError::NonFinite {
                body: body.name.clone(),
            });
        }
        let attitude = body
            .attitude
            .as_ref()
            .map(|server| self.attitude_state(server, time))
            .transpose()
            .map_err(frame_error)?;

        Ok(ResolvedBody {
            name: body.name.clone(),
            state,
            attitude,
            rank_key: (state.position - camera).norm(),
        })
    }

    /// Resolve every body; a failure only affects its own entry
    pub fn resolve_all(
        &self,
        bodies: &[BodyDescriptor],
        time: JulianDate,
        camera: &Vector3<f64>,
    ) -> Vec<Result<ResolvedBody>> {
        bodies
            .iter()
            .map(|body| {
                let resolved = self.resolve(body, time, camera);
                if let Err(e) = &resolved {
                    warn!("Skipping {} at {}: {}", body.name, time, e);
                }
                resolved
            })
            .collect()
    }

    /// Re-express a precomputed state in the working frame
    pub fn convert(
        &self,
        raw: &PositionedVelocity,
    ) -> std::result::Result<PositionedVelocity, FrameError> {
        let working = self.config.working_frame;
        let transform = Frame::transform(&raw.frame, &working)?;
        Ok(PositionedVelocity::new(
            transform.apply(&raw.position),
            transform.apply_vector(&raw.velocity),
            working,
        ))
    }

    fn attitude_state(
        &self,
        server: &AttitudeServer,
        time: JulianDate,
    ) -> std::result::Result<AttitudeState, FrameError> {
        let rotation =
            Frame::transform(&server.frame(), &self.config.working_frame)?.to_rotation()?;
        Ok(server.state_at(time).rotated(&rotation))
    }

    fn series_state(&self, series: &OrbitalSeries, time: JulianDate) -> PositionedVelocity {
        let at = |t: JulianDate| self.evaluator.spherical(series, t.tau()).to_cartesian();

        let h = self.config.velocity_step_days;
        let velocity = (at(time + h) - at(time - h)) / (2.0 * h);
        PositionedVelocity::new(at(time), velocity, series.frame())
    }
}

impl Default for PositionAttitudeResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}
