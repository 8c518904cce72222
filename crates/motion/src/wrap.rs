//! Periodic wrap closure for sampled motion tables.
//!
//! The stored grid ends one step (or an uneven remainder) short of 360°, so
//! the table only represents a periodic signal if linear extrapolation of
//! the trailing samples lands on sample 0. Discretization leaves a small
//! residual there; the passes below remove it by adjusting the last two
//! samples of each channel.

use camcore::RampProfile;
use nalgebra::Vector2;

use crate::law::SegmentPlan;

/// Tikhonov weight on the closure adjustment.
const RIDGE: f64 = 1e-12;
/// Acceleration scale factor applied just past each interior boundary.
const BOUNDARY_SCALE: f64 = 1.0 - 1e-12;
/// Magnitude of the pre-boundary acceleration nudge for cycloidal ramps.
const PRE_BOUNDARY_NUDGE: f64 = 1e-12;
/// Trailing/leading window width of the second closure pass.
const MEAN_WINDOW: usize = 3;

pub(crate) fn apply(
    plan: &SegmentPlan,
    profile: RampProfile,
    step_deg: f64,
    x: &mut [f64],
    v: &mut [f64],
    a: &mut [f64],
) {
    let n = x.len();
    if n < 3 {
        return;
    }
    nudge_boundaries(plan, profile, step_deg, a);
    close_displacement(step_deg, x);

    // A final sample sitting exactly on an interior segment boundary carries
    // a designed discontinuity; leave it alone.
    let last_theta = (n - 1) as f64 * step_deg;
    let on_boundary = plan
        .interior_bounds()
        .any(|b| (b - last_theta).abs() < 1e-9);
    if !on_boundary {
        let rho = wrap_ratio(step_deg, n);
        extrapolate_last(v, rho);
        extrapolate_last(a, rho);
    }
}

/// Gap between the last sample and 360°, in units of the grid step.
fn wrap_ratio(step_deg: f64, n: usize) -> f64 {
    (360.0 - (n as f64 - 1.0) * step_deg) / step_deg
}

/// Linear extrapolation of the last two samples to 360°.
fn extrapolated(channel: &[f64], rho: f64) -> f64 {
    let n = channel.len();
    (1.0 + rho) * channel[n - 1] - rho * channel[n - 2]
}

/// Replace the final sample with the value that makes extrapolation to 360°
/// land exactly on sample 0.
fn extrapolate_last(channel: &mut [f64], rho: f64) {
    let n = channel.len();
    channel[n - 1] = (channel[0] + rho * channel[n - 2]) / (1.0 + rho);
}

/// Adjustments above this are no longer numerically invisible; leave the
/// channel for the preflight checker to flag instead.
fn closure_bound(x: &[f64]) -> f64 {
    let max_abs = x.iter().fold(0.0_f64, |m, &v| m.max(v.abs()));
    (1e-3 * max_abs).max(1e-9)
}

/// Two-pass displacement closure at the wrap point.
fn close_displacement(step_deg: f64, x: &mut [f64]) {
    let n = x.len();
    let rho = wrap_ratio(step_deg, n);
    let bound = closure_bound(x);

    // Pass 1: constrained least squares on the last two samples. The hard
    // constraint pins the extrapolated value at 360° to x[0]; the remaining
    // degree of freedom minimizes the first/second difference residuals at
    // the wrap, with a negligible ridge term.
    let residual = x[0] - extrapolated(x, rho);
    if residual != 0.0 {
        // Constraint normal (-rho, 1+rho) and its null direction.
        let normal = Vector2::new(-rho, 1.0 + rho);
        let dir = Vector2::new(1.0 + rho, rho);
        let particular = normal * (residual / normal.norm_squared());

        // s1: slope across the wrap vs slope leaving sample 0; gradient (-1, 1).
        // s2: second difference across the wrap; gradient (1, -2).
        let s1_base = (x[n - 1] - x[n - 2]) - (x[1] - x[0]);
        let s2_base = x[0] - 2.0 * x[n - 1] + x[n - 2];
        let s1 = s1_base + (particular.y - particular.x);
        let s2 = s2_base + (particular.x - 2.0 * particular.y);
        let c1 = -dir.x + dir.y;
        let c2 = dir.x - 2.0 * dir.y;
        let t = -(s1 * c1 + s2 * c2 + RIDGE * particular.dot(&dir))
            / (c1 * c1 + c2 * c2 + RIDGE * dir.norm_squared());
        let delta = particular + dir * t;

        if delta.amax() <= bound {
            x[n - 2] += delta.x;
            x[n - 1] += delta.y;
        }
    }

    // Pass 2: match the trailing-window mean to the leading-window mean with
    // the same two unknowns, applied only if it strictly improves the wrap
    // residual.
    if n >= 2 * MEAN_WINDOW {
        let lead: f64 = x[..MEAN_WINDOW].iter().sum::<f64>() / MEAN_WINDOW as f64;
        let trail: f64 = x[n - MEAN_WINDOW..].iter().sum::<f64>() / MEAN_WINDOW as f64;
        let shift = (MEAN_WINDOW as f64) * (lead - trail) / 2.0;
        if shift != 0.0 && shift.abs() <= bound {
            let before = wrap_residual(x[0], x[n - 2], x[n - 1], rho);
            let after = wrap_residual(x[0], x[n - 2] + shift, x[n - 1] + shift, rho);
            if after < before {
                x[n - 2] += shift;
                x[n - 1] += shift;
            }
        }
    }
}

/// Residual metric: extrapolation miss plus wrap second difference.
fn wrap_residual(first: f64, prev: f64, last: f64, rho: f64) -> f64 {
    let wrap = (1.0 + rho) * last - rho * prev;
    (wrap - first).abs() + (first - 2.0 * last + prev).abs()
}

/// Soften exact equalities around interior segment boundaries.
///
/// The first acceleration sample past each boundary is scaled by a factor
/// just under one, and for cycloidal ramps an exactly-zero sample right
/// before the boundary takes the sign of the post-boundary value at
/// negligible magnitude. Downstream continuity checks compare neighbouring
/// samples with strict inequalities and cannot cope with exactly equal or
/// exactly zero pairs at these points.
fn nudge_boundaries(plan: &SegmentPlan, profile: RampProfile, step_deg: f64, a: &mut [f64]) {
    let n = a.len();
    for b in plan.interior_bounds() {
        let k = ((b - 1e-9) / step_deg).ceil() as usize;
        if k == 0 || k >= n {
            continue;
        }
        a[k] *= BOUNDARY_SCALE;
        if profile == RampProfile::Cycloidal && a[k] != 0.0 && a[k - 1] == 0.0 {
            a[k - 1] = a[k].signum() * PRE_BOUNDARY_NUDGE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::law::synthesize;
    use crate::profile;
    use approx::assert_relative_eq;
    use camcore::{CamParams, GeometryParams};

    const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

    fn params(step_deg: f64, profile: RampProfile) -> CamParams {
        CamParams {
            stroke_mm: 20.0,
            dwell_tdc_deg: 10.0,
            dwell_bdc_deg: 10.0,
            ramp_before_tdc_deg: 25.0,
            ramp_after_tdc_deg: 25.0,
            ramp_before_bdc_deg: 25.0,
            ramp_after_bdc_deg: 25.0,
            up_fraction: 0.5,
            step_deg,
            profile,
            geometry: GeometryParams::default(),
        }
    }

    fn extrapolate_channel(values: &[f64], rho: f64) -> f64 {
        let n = values.len();
        (1.0 + rho) * values[n - 1] - rho * values[n - 2]
    }

    #[test]
    fn displacement_closes_on_exact_grid() {
        let table = synthesize(&params(1.0, RampProfile::Quintic)).unwrap();
        let xs: Vec<f64> = table.samples.iter().map(|s| s.x_mm).collect();
        let wrap = extrapolate_channel(&xs, table.wrap_ratio());
        assert!(wrap.abs() < 1e-9, "wrap displacement {wrap}");
    }

    #[test]
    fn displacement_closes_on_uneven_grid() {
        // 0.7° does not divide 360; the wrap step is 0.9°.
        let table = synthesize(&params(0.7, RampProfile::Cycloidal)).unwrap();
        let xs: Vec<f64> = table.samples.iter().map(|s| s.x_mm).collect();
        let wrap = extrapolate_channel(&xs, table.wrap_ratio());
        assert!(wrap.abs() < 1e-9, "wrap displacement {wrap}");
    }

    #[test]
    fn velocity_and_acceleration_extrapolate_to_sample_zero() {
        for profile in [
            RampProfile::Cycloidal,
            RampProfile::Quintic,
            RampProfile::Septic,
        ] {
            let table = synthesize(&params(1.0, profile)).unwrap();
            let rho = table.wrap_ratio();
            let vs: Vec<f64> = table.samples.iter().map(|s| s.v_mm_per_omega).collect();
            let accs: Vec<f64> = table.samples.iter().map(|s| s.a_mm_per_omega2).collect();
            assert_relative_eq!(extrapolate_channel(&vs, rho), vs[0], epsilon = 1e-9);
            assert_relative_eq!(extrapolate_channel(&accs, rho), accs[0], epsilon = 1e-9);
        }
    }

    #[test]
    fn final_sample_on_a_boundary_keeps_its_value() {
        // ramp_before_tdc of one step puts the last sample exactly on the
        // segment boundary at 359°; the designed value must survive.
        let mut p = params(1.0, RampProfile::Quintic);
        p.ramp_before_tdc_deg = 1.0;
        p.dwell_tdc_deg = 9.0;
        p.ramp_after_tdc_deg = 25.0;
        let table = synthesize(&p).unwrap();
        let last = table.samples.last().unwrap();
        assert_eq!(last.theta_deg, 359.0);
        // At the start of the final ramp the follower still runs at the full
        // expansion velocity; the wrap replacement would have halved it.
        let min_v = table
            .samples
            .iter()
            .map(|s| s.v_mm_per_omega)
            .fold(f64::INFINITY, f64::min);
        assert_relative_eq!(last.v_mm_per_omega, min_v, max_relative = 1e-9);
    }

    #[test]
    fn post_boundary_acceleration_is_scaled() {
        // Dwell ends at 9.5°, between samples: the first in-ramp sample at
        // 10° must carry the one-ulp-ish scale factor.
        let mut p = params(1.0, RampProfile::Quintic);
        p.dwell_tdc_deg = 9.5;
        p.ramp_after_tdc_deg = 25.0;
        let table = synthesize(&p).unwrap();
        let sample = &table.samples[10];

        // Reconstruct the analytic value at u = 0.5 / 25 into the ramp.
        // Fixed spans total 119.5°, so each CV segment spans 120.25°.
        let span_rad = 25.0 * DEG_TO_RAD;
        let ramp_area = profile::integral(p.profile, 1.0);
        let cv_up = 120.25 * DEG_TO_RAD;
        let denom = 25.0 * DEG_TO_RAD * ramp_area + cv_up + 25.0 * DEG_TO_RAD * (1.0 - ramp_area);
        let v_up = 20.0 / denom;
        let analytic = v_up * profile::eval(p.profile, 0.5 / 25.0).ds / span_rad;
        assert_relative_eq!(
            sample.a_mm_per_omega2,
            analytic * BOUNDARY_SCALE,
            max_relative = 1e-12
        );
    }

    #[test]
    fn cycloidal_pre_boundary_zero_takes_the_post_sign() {
        let mut p = params(1.0, RampProfile::Cycloidal);
        p.dwell_tdc_deg = 9.5;
        p.ramp_after_tdc_deg = 25.0;
        let table = synthesize(&p).unwrap();
        // Sample 9 sits in the dwell where acceleration is exactly zero
        // before the nudge; sample 10 is accelerating upward.
        let pre = table.samples[9].a_mm_per_omega2;
        let post = table.samples[10].a_mm_per_omega2;
        assert!(post > 0.0);
        assert_eq!(pre, PRE_BOUNDARY_NUDGE);
    }

    #[test]
    fn quintic_pre_boundary_zero_is_left_alone() {
        let mut p = params(1.0, RampProfile::Quintic);
        p.dwell_tdc_deg = 9.5;
        p.ramp_after_tdc_deg = 25.0;
        let table = synthesize(&p).unwrap();
        assert_eq!(table.samples[9].a_mm_per_omega2, 0.0);
    }

    #[test]
    fn closure_leaves_interior_samples_untouched() {
        // The corrector only ever edits the last two samples of a channel.
        let p = params(1.0, RampProfile::Quintic);
        let table = synthesize(&p).unwrap();
        let n = table.len();
        let step_rad = p.step_deg * DEG_TO_RAD;
        let mut x = 0.0;
        for k in 1..n - 2 {
            let prev = table.samples[k - 1].v_mm_per_omega;
            let cur = table.samples[k].v_mm_per_omega;
            x += 0.5 * (prev + cur) * step_rad;
            assert_relative_eq!(table.samples[k].x_mm, x, epsilon = 1e-12);
        }
    }
}
