//! Prototype pitch-radius curves.
//!
//! Both curves are monotone-affine sketches over a normalized parameter
//! s ∈ [0, 1]; they give the plotting layer a geometric envelope to draw
//! next to the ratio curve and involve no iterative solving.

use camcore::GeometryParams;

/// Number of evenly spaced samples over s ∈ [0, 1].
pub const PITCH_POINTS: usize = 101;
/// Minimum separation kept between ring and planet curves, mm.
pub const RING_CLEARANCE_MM: f64 = 0.5;
/// Radius floor, mm.
const MIN_RADIUS_MM: f64 = 1e-6;

/// Build the planet and ring pitch prototypes as (s, radius_mm) pairs.
pub fn synthesize_pitch(geo: &GeometryParams) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let mut planet = Vec::with_capacity(PITCH_POINTS);
    let mut ring = Vec::with_capacity(PITCH_POINTS);
    for k in 0..PITCH_POINTS {
        let s = k as f64 / (PITCH_POINTS - 1) as f64;
        let r_planet = (geo.planet_r0_mm + geo.planet_k_mm * s).max(MIN_RADIUS_MM);
        let r_ring = (geo.ring_bias_mm + geo.ring_scale_mm * s).max(r_planet + RING_CLEARANCE_MM);
        planet.push((s, r_planet));
        ring.push((s, r_ring));
    }
    (planet, ring)
}
