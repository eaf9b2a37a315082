//! Starframe: positions, attitudes and camera ranking for real-time sky rendering
//!
//! This crate is the numeric core of a sky renderer. Given a simulation time
//! and a camera position it evaluates analytical orbit series or stored
//! ephemerides, converts between reference frames, resolves body attitudes
//! and ranks bodies by distance to the camera.
//!
//! ```no_run
//! use starframe::{BodyDescriptor, JulianDate, PositionAttitudeResolver, ResolverConfig};
//! use starframe::ranking::RankingPass;
//! use starframe::series::vsop87;
//!
//! let resolver = PositionAttitudeResolver::new(ResolverConfig::default().with_global_accuracy());
//! let earth = BodyDescriptor::series("Earth", vsop87::earth());
//! let camera = nalgebra::Vector3::new(0.0, 0.0, 1.5);
//!
//! let resolved = resolver.resolve(&earth, JulianDate::J2000, &camera)?;
//! let bodies = [resolved];
//! let order = RankingPass::from_keys(&bodies, |b| b.rank_key).far_first();
//! # Ok::<(), starframe::StarframeError>(())
//! ```

use thiserror::Error;

pub mod attitude;
pub mod config;
pub mod constants;
pub mod coordinates;
pub mod ephemeris;
pub mod framelib;
pub mod ranking;
pub mod resolver;
pub mod series;
pub mod time;

// Re-export commonly used types
pub use attitude::{AttitudeSample, AttitudeServer, AttitudeState};
pub use config::{global_accuracy, set_global_accuracy, AccuracyMode, ResolverConfig};
pub use framelib::{ChangeOfBasis, Frame};
pub use ranking::{far_first, near_first, Positioned, RankOrder};
pub use resolver::{
    BodyDescriptor, PositionAttitudeResolver, PositionSource, PositionedVelocity, ResolvedBody,
};
pub use series::{OrbitalSeries, Quantity, SeriesEvaluator, SeriesTerm};
pub use time::JulianDate;

/// Main error type for the starframe library
#[derive(Debug, Error)]
pub enum StarframeError {
    #[error("Time error: {0}")]
    Time(#[from] time::TimeError),

    #[error("Series error: {0}")]
    Series(#[from] series::SeriesError),

    #[error("Frame error: {0}")]
    Frame(#[from] framelib::FrameError),

    #[error("Attitude error: {0}")]
    Attitude(#[from] attitude::AttitudeError),

    #[error("Ephemeris error: {0}")]
    Ephemeris(#[from] ephemeris::EphemerisError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] resolver::ResolveError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Result type for starframe operations
pub type Result<T> = std::result::Result<T, StarframeError>;
