//! Transmission-ratio estimation and pitch prototypes
//!
//! This crate provides:
//! - Geometry-based instantaneous transmission-ratio estimation with
//!   singularity-safe handling near the slider axis
//! - An optional calibration path against an externally supplied reference
//!   angular curve, injected through [`ReferenceCurveProvider`]
//! - Prototype planet/ring pitch curves
//!
//! The estimation stage never fails: any internal problem degrades to a
//! structurally valid identity result.

pub mod pitch;
pub mod ratio;
pub mod reference;

pub use pitch::*;
pub use ratio::*;
pub use reference::*;
