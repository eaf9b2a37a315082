use super::{Component, OrbitalSeries, Quantity, SeriesTerm, BUCKETS};
use crate::constants::LOW_ACCURACY_SKIP;
use crate::coordinates::Spherical;
use log::warn;
use serde::{Deserialize, Serialize};

/// Which part of each bucket is summed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyMode {
    /// Every term
    #[default]
    High,
    /// Only the leading terms of each bucket
    Low,
}

/// Evaluates orbital series with a fixed accuracy mode
///
/// The evaluator holds no per-call state; one value can be shared by every
/// thread of a resolve pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesEvaluator {
    mode: AccuracyMode,
    low_accuracy_skip: f64,
}

impl SeriesEvaluator {
    pub fn new(mode: AccuracyMode) -> Self {
        SeriesEvaluator {
            mode,
            low_accuracy_skip: LOW_ACCURACY_SKIP,
        }
    }

    /// Fraction of each bucket dropped in low accuracy mode, clamped to [0, 1]
    pub fn with_low_accuracy_skip(mut self, fraction: f64) -> Self {
        self.low_accuracy_skip = if fraction.is_nan() {
            warn!("Low accuracy skip fraction is NaN, using {}", LOW_ACCURACY_SKIP);
            LOW_ACCURACY_SKIP
        } else if !(0.0..=1.0).contains(&fraction) {
            let clamped = fraction.clamp(0.0, 1.0);
            warn!("Low accuracy skip fraction {} clamped to {}", fraction, clamped);
            clamped
        } else {
            fraction
        };
        self
    }

    pub fn set_accuracy(&mut self, mode: AccuracyMode) {
        self.mode = mode;
    }

    pub fn accuracy(&self) -> AccuracyMode {
        self.mode
    }

    pub fn low_accuracy_skip(&self) -> f64 {
        self.low_accuracy_skip
    }

    /// Number of leading terms summed for a bucket of `len` terms
    pub fn kept_terms(&self, len: usize) -> usize {
        match self.mode {
            AccuracyMode::High => len,
            AccuracyMode::Low => len - (len as f64 * self.low_accuracy_skip).floor() as usize,
        }
    }

    /// Value of one bucket polynomial at `t` Julian millennia from J2000
    ///
    /// Terms are summed in ascending index order. Orders above 5 yield 0.0.
    pub fn evaluate(&self, series: &OrbitalSeries, quantity: Quantity, t: f64) -> f64 {
        let terms = series.terms(quantity);
        sum_terms(&terms[..self.kept_terms(terms.len())], t)
    }

    /// Full component value, `Σ_k evaluate(k) · t^k`
    pub fn evaluate_component(&self, series: &OrbitalSeries, component: Component, t: f64) -> f64 {
        (0..BUCKETS)
            .map(|order| {
                self.evaluate(series, Quantity::new(component, order), t) * t.powi(order as i32)
            })
            .sum()
    }

    /// (L, B, R) at `t` Julian millennia, longitude normalised to [0, 2π)
    pub fn spherical(&self, series: &OrbitalSeries, t: f64) -> Spherical {
        let lon = self.evaluate_component(series, Component::Longitude, t);
        let lat = self.evaluate_component(series, Component::Latitude, t);
        let radius = self.evaluate_component(series, Component::Radius, t);
        Spherical::new(lon, lat, radius)
    }
}

impl Default for SeriesEvaluator {
    fn default() -> Self {
        Self::new(AccuracyMode::High)
    }
}

#[inline]
fn sum_terms(terms: &[SeriesTerm], t: f64) -> f64 {
    let mut acc = 0.0;
    for term in terms {
        acc += term.value(t);
    }
    acc
}
