//! Analytical orbital series in the VSOP87 layout
//!
//! A series holds three components (longitude L, latitude B, radius R), each
//! split into six buckets of harmonic terms. Bucket `k` of a component is
//! multiplied by `t^k`, with `t` in Julian millennia from J2000:
//!
//! ```text
//! L(t) = Σ_k t^k Σ_i a_i cos(b_i + c_i t)
//! ```
//!
//! The 18 addressable polynomials are named `L0..L5`, `B0..B5`, `R0..R5`.

mod evaluator;
pub mod vsop87;

pub use evaluator::{AccuracyMode, SeriesEvaluator};

use crate::framelib::Frame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of truncation buckets per component
pub const BUCKETS: usize = 6;

/// Number of addressable polynomials per series
pub const QUANTITIES: usize = 3 * BUCKETS;

/// Error type for series construction
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Bucket order {0} is outside 0..=5")]
    BucketOutOfRange(usize),

    #[error("Term {index} of {quantity} is not finite")]
    NonFiniteTerm { quantity: Quantity, index: usize },

    #[error("Unknown series quantity: {0}")]
    UnknownQuantity(String),
}

/// Result type for series operations
pub type Result<T> = std::result::Result<T, SeriesError>;

/// One harmonic term, contributing `amplitude * cos(phase + frequency * t)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesTerm {
    pub amplitude: f64,
    pub phase: f64,
    pub frequency: f64,
}

impl SeriesTerm {
    pub const fn new(amplitude: f64, phase: f64, frequency: f64) -> Self {
        SeriesTerm {
            amplitude,
            phase,
            frequency,
        }
    }

    #[inline]
    pub fn value(&self, t: f64) -> f64 {
        self.amplitude * (self.phase + self.frequency * t).cos()
    }

    fn is_finite(&self) -> bool {
        self.amplitude.is_finite() && self.phase.is_finite() && self.frequency.is_finite()
    }
}

/// Series components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    /// Longitude L, radians
    Longitude,
    /// Latitude B, radians
    Latitude,
    /// Radius vector R, distance units of the series
    Radius,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::Longitude, Component::Latitude, Component::Radius];

    pub fn letter(&self) -> char {
        match self {
            Component::Longitude => 'L',
            Component::Latitude => 'B',
            Component::Radius => 'R',
        }
    }

    fn index(&self) -> usize {
        match self {
            Component::Longitude => 0,
            Component::Latitude => 1,
            Component::Radius => 2,
        }
    }
}

/// One of the addressable polynomials of a series, e.g. `B3`
///
/// Orders above 5 are representable and evaluate to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quantity {
    pub component: Component,
    pub order: usize,
}

impl Quantity {
    pub const fn new(component: Component, order: usize) -> Self {
        Quantity { component, order }
    }

    /// Quantity from its flat index: 0..=5 are `L0..L5`, 6..=11 `B0..B5`, 12..=17 `R0..R5`
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= QUANTITIES {
            return None;
        }
        Some(Quantity::new(Component::ALL[index / BUCKETS], index % BUCKETS))
    }

    /// Flat index, if the order is in range
    pub fn index(&self) -> Option<usize> {
        (self.order < BUCKETS).then(|| self.component.index() * BUCKETS + self.order)
    }

    /// All 18 quantities in index order
    pub fn all() -> impl Iterator<Item = Quantity> {
        (0..QUANTITIES).filter_map(Quantity::from_index)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.component.letter(), self.order)
    }
}

impl FromStr for Quantity {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || SeriesError::UnknownQuantity(s.to_string());
        let mut chars = s.trim().chars();
        let component = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('L') => Component::Longitude,
            Some('B') => Component::Latitude,
            Some('R') => Component::Radius,
            _ => return Err(unknown()),
        };
        let order: usize = chars.as_str().parse().map_err(|_| unknown())?;
        Ok(Quantity::new(component, order))
    }
}

/// A named analytical series for one body
///
/// Buckets are kept in the order they were supplied; the low accuracy mode
/// keeps the leading terms, so terms should be sorted by decreasing amplitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalSeries {
    name: String,
    frame: Frame,
    buckets: [[Vec<SeriesTerm>; BUCKETS]; 3],
}

impl OrbitalSeries {
    /// Create an empty series whose spherical output is expressed in `frame`
    pub fn new(name: impl Into<String>, frame: Frame) -> Self {
        OrbitalSeries {
            name: name.into(),
            frame,
            buckets: Default::default(),
        }
    }

    /// Set the terms of one bucket, replacing any previous terms
    pub fn with_bucket(mut self, quantity: Quantity, terms: Vec<SeriesTerm>) -> Result<Self> {
        let index = quantity
            .index()
            .ok_or(SeriesError::BucketOutOfRange(quantity.order))?;
        if let Some(bad) = terms.iter().position(|term| !term.is_finite()) {
            return Err(SeriesError::NonFiniteTerm {
                quantity,
                index: bad,
            });
        }

        self.buckets[index / BUCKETS][index % BUCKETS] = terms;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frame of the evaluated (L, B, R) coordinates
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Terms of one bucket; empty for orders above 5
    pub fn terms(&self, quantity: Quantity) -> &[SeriesTerm] {
        match quantity.index() {
            Some(index) => &self.buckets[index / BUCKETS][index % BUCKETS],
            None => &[],
        }
    }

    /// Total number of terms across all buckets
    pub fn term_count(&self) -> usize {
        self.buckets.iter().flatten().map(Vec::len).sum()
    }
}
