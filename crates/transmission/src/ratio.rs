//! Instantaneous transmission-ratio estimation.
//!
//! The geometry path derives dψ/dα from the synthesized velocity channel and
//! the journal geometry, with a sign-preserving denominator floor near the
//! slider-axis singularity. When a reference angular curve is available the
//! ratio is taken from its finite-differenced rate instead. Either way the
//! published curve is strictly positive, periodic at the endpoints, and
//! normalized to an exact mean of one.

use std::f64::consts::PI;

use camcore::{CamParams, GeometryParams, MotionTable, ReferenceCurve, TransmissionTables};
use log::{debug, warn};
use thiserror::Error;

use crate::pitch::synthesize_pitch;
use crate::reference::ReferenceCurveProvider;

const DEG_TO_RAD: f64 = PI / 180.0;

/// Denominator magnitude floor as a fraction of the journal radius.
const DENOM_FLOOR_FRACTION: f64 = 0.15;
/// Positive floor applied to the ratio curve before normalization.
const RATIO_FLOOR: f64 = 1e-6;
/// Half-width of the circular moving-average smoothing window.
const SMOOTH_HALF_WINDOW: usize = 5;

/// Internal failure modes of the estimation stage; never escape
/// [`build_transmission`].
#[derive(Debug, Error)]
enum RatioError {
    #[error("motion table too small: {0} samples")]
    TableTooSmall(usize),

    #[error("journal radius must be positive, got {0}")]
    JournalRadius(f64),

    #[error("non-finite ratio at sample {0}")]
    NonFinite(usize),
}

/// Derive the transmission ratio and pitch prototypes for a motion table.
///
/// This call always returns a structurally valid result: if anything inside
/// the stage fails, the table degrades to a flat unity ratio with empty
/// pitch curves and a zero residual.
pub fn build_transmission(
    table: &MotionTable,
    params: &CamParams,
    provider: &dyn ReferenceCurveProvider,
) -> TransmissionTables {
    match try_build(table, params, provider) {
        Ok(tables) => tables,
        Err(err) => {
            warn!("transmission stage degraded to identity fallback: {err}");
            identity_fallback(table)
        }
    }
}

fn try_build(
    table: &MotionTable,
    params: &CamParams,
    provider: &dyn ReferenceCurveProvider,
) -> Result<TransmissionTables, RatioError> {
    let n = table.len();
    if n < 3 {
        return Err(RatioError::TableTooSmall(n));
    }
    let geo = &params.geometry;
    if !(geo.journal_radius_mm > 0.0) {
        return Err(RatioError::JournalRadius(geo.journal_radius_mm));
    }

    let mut values = geometry_ratio(table, geo);
    values = smooth_circular(&values, SMOOTH_HALF_WINDOW);
    finalize(&mut values);

    // Calibration replaces the geometry curve wholesale when a usable
    // reference is published for this parameter set.
    if let Some(curve) = provider.reference_curve(params) {
        match calibrated_ratio(&curve, n, table.step_deg) {
            Some(calibrated) => values = calibrated,
            None => debug!("reference curve unusable; keeping geometry-derived ratio"),
        }
    }

    for (k, value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(RatioError::NonFinite(k));
        }
    }

    let residual = arc_length_residual_rms(&values, table.step_deg);
    let (pitch_planet, pitch_ring) = synthesize_pitch(geo);
    let ratio = table
        .samples
        .iter()
        .zip(&values)
        .map(|(s, &r)| (s.theta_deg, r))
        .collect();
    Ok(TransmissionTables {
        ratio,
        pitch_planet,
        pitch_ring,
        arc_length_residual_rms: residual,
    })
}

/// Per-sample geometry estimate i = 1 + dψ/dα = 1 - v / (R sin((θ+β) - γ)).
///
/// The denominator magnitude is floored at 0.15 R (sign preserved, positive
/// at exactly zero) so the estimate stays bounded through the geometric
/// singularity.
fn geometry_ratio(table: &MotionTable, geo: &GeometryParams) -> Vec<f64> {
    let radius = geo.journal_radius_mm;
    let floor = DENOM_FLOOR_FRACTION * radius;
    table
        .samples
        .iter()
        .map(|s| {
            let arg =
                (s.theta_deg + geo.journal_phase_deg - geo.slider_axis_deg) * DEG_TO_RAD;
            let mut denom = radius * arg.sin();
            if denom.abs() < floor {
                denom = if denom < 0.0 { -floor } else { floor };
            }
            1.0 - s.v_mm_per_omega / denom
        })
        .collect()
}

/// Centered circular moving average over ±`half` samples.
fn smooth_circular(values: &[f64], half: usize) -> Vec<f64> {
    let n = values.len() as isize;
    let half = half as isize;
    let window = 2 * half + 1;
    (0..n)
        .map(|k| {
            let mut sum = 0.0;
            for offset in -half..=half {
                sum += values[(k + offset).rem_euclid(n) as usize];
            }
            sum / window as f64
        })
        .collect()
}

/// Clamp to the positive floor, pin the periodic endpoint, normalize the
/// arithmetic mean to exactly one.
fn finalize(values: &mut [f64]) {
    let n = values.len();
    for v in values.iter_mut() {
        *v = v.max(RATIO_FLOOR);
    }
    values[n - 1] = values[0];
    let mean = values.iter().sum::<f64>() / n as f64;
    for v in values.iter_mut() {
        *v /= mean;
    }
}

/// Ratio curve from a reference angular curve: centered finite difference of
/// φ(θ) with ±180° wraparound correction, mean-normalized, endpoint-pinned
/// and renormalized. `None` if the curve cannot be used.
fn calibrated_ratio(curve: &ReferenceCurve, n: usize, step_deg: f64) -> Option<Vec<f64>> {
    if curve.phi_deg.len() != n || curve.theta_deg.len() != n {
        return None;
    }
    let mut rate = vec![0.0; n];
    for k in 0..n {
        let next = curve.phi_deg[(k + 1) % n];
        let prev = curve.phi_deg[(k + n - 1) % n];
        let mut dphi = next - prev;
        if dphi > 180.0 {
            dphi -= 360.0;
        } else if dphi < -180.0 {
            dphi += 360.0;
        }
        rate[k] = dphi / (2.0 * step_deg);
    }
    if rate.iter().any(|r| !r.is_finite()) {
        return None;
    }
    let mean = rate.iter().sum::<f64>() / n as f64;
    if !(mean > 0.0) {
        return None;
    }
    for r in rate.iter_mut() {
        *r /= mean;
    }
    rate[n - 1] = rate[0];
    let mean = rate.iter().sum::<f64>() / n as f64;
    for r in rate.iter_mut() {
        *r /= mean;
    }
    Some(rate)
}

/// RMS mismatch between the normalized cumulative arc-length curves of a
/// uniform cam increment and the ratio-weighted ring increment. A design
/// quality figure, not a gate.
fn arc_length_residual_rms(values: &[f64], step_deg: f64) -> f64 {
    let n = values.len();
    let mut cam = Vec::with_capacity(n);
    let mut ring = Vec::with_capacity(n);
    let mut cam_acc = 0.0;
    let mut ring_acc = 0.0;
    for &v in values {
        cam_acc += step_deg;
        ring_acc += v * step_deg;
        cam.push(cam_acc);
        ring.push(ring_acc);
    }
    if !(cam_acc > 0.0) || !(ring_acc > 0.0) {
        return 0.0;
    }
    let sum_sq: f64 = cam
        .iter()
        .zip(&ring)
        .map(|(c, r)| {
            let diff = c / cam_acc - r / ring_acc;
            diff * diff
        })
        .sum();
    (sum_sq / n as f64).sqrt()
}

/// Flat unity ratio parallel to the table, no pitch curves, zero residual.
fn identity_fallback(table: &MotionTable) -> TransmissionTables {
    TransmissionTables {
        ratio: table.samples.iter().map(|s| (s.theta_deg, 1.0)).collect(),
        pitch_planet: Vec::new(),
        pitch_ring: Vec::new(),
        arc_length_residual_rms: 0.0,
    }
}
