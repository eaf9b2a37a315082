//! Reference frames and change-of-basis transforms
//!
//! Frames are described by their axes in J2000 equatorial coordinates and
//! converted through that hub. Conversions operate on Cartesian vectors in
//! the astronomical convention (see [`crate::coordinates`]).

pub mod basis;
pub mod frames;

pub use basis::{ChangeOfBasis, FrameError};
pub use frames::{named_frames, named_transform, obliquity, Frame};
