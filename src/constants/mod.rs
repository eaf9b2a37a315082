//! Constants module for ephemeris and frame calculations

use std::f64::consts::PI;

// Astronomical distances
/// Astronomical Unit in kilometers
pub const AU_KM: f64 = 149_597_870.700;

// Time constants
/// Seconds in a day
pub const DAY_S: f64 = 86_400.0;
/// J2000.0 epoch as Julian date
pub const J2000: f64 = 2_451_545.0;
/// Days in a Julian century
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;
/// Days in a Julian millennium, the time unit of VSOP87 series
pub const DAYS_PER_JULIAN_MILLENNIUM: f64 = 365_250.0;

// Angles
/// Degrees to radians conversion factor
pub const DEG2RAD: f64 = PI / 180.0;
/// Radians to degrees conversion factor
pub const RAD2DEG: f64 = 180.0 / PI;
/// Tau (2*PI) for full circle
pub const TAU: f64 = 2.0 * PI;

// Frames
/// Obliquity of the ecliptic at J2000.0 in degrees
pub const OBLIQUITY_J2000_DEG: f64 = 23.439_280_8;
/// Smallest |det| accepted for a change-of-basis matrix, after dividing by
/// the product of the axis lengths
pub const DEGENERACY_EPSILON: f64 = 1e-9;

// Resolver defaults
/// Fraction of each series bucket skipped in low accuracy mode
pub const LOW_ACCURACY_SKIP: f64 = 0.9;
/// Half-width of the central difference used for series velocities, in days
pub const VELOCITY_STEP_DAYS: f64 = 1.0 / 24.0;
