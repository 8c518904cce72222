//! Eight-segment periodic motion-law synthesis.
//!
//! The cycle runs dwell at TDC → ramp → constant-velocity compression →
//! ramp into BDC → dwell at BDC → ramp → constant-velocity expansion →
//! ramp back into TDC, closing at 360°. Velocity and acceleration are
//! evaluated analytically per segment; displacement is the trapezoidal
//! integral of velocity over angle.

use std::f64::consts::PI;

use camcore::{CamParams, MotionSample, MotionTable, ParamError, RampProfile};
use log::debug;

use crate::profile;
use crate::wrap;

const DEG_TO_RAD: f64 = PI / 180.0;

/// Cumulative segment end angles in degrees, clamped into [0, 360].
///
/// Order: TDC dwell, ramp after TDC, compression CV, ramp before BDC,
/// BDC dwell, ramp after BDC, expansion CV, ramp before TDC.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SegmentPlan {
    pub bounds: [f64; 8],
}

impl SegmentPlan {
    /// Boundaries strictly inside (0, 360); the wrap point is not one.
    pub fn interior_bounds(&self) -> impl Iterator<Item = f64> + '_ {
        self.bounds
            .iter()
            .copied()
            .filter(|&b| b > 0.0 && b < 360.0)
    }
}

fn plan_segments(params: &CamParams) -> SegmentPlan {
    let fixed_spans = [
        params.dwell_tdc_deg.max(0.0),
        params.ramp_after_tdc_deg.max(0.0),
        params.ramp_before_bdc_deg.max(0.0),
        params.dwell_bdc_deg.max(0.0),
        params.ramp_after_bdc_deg.max(0.0),
        params.ramp_before_tdc_deg.max(0.0),
    ];
    let fixed: f64 = fixed_spans.iter().sum();
    // Whatever the dwells and ramps leave of the revolution goes to the two
    // constant-velocity segments; an over-subscribed cycle gets none.
    let free = (360.0 - fixed).max(0.0);
    let up_fraction = params.up_fraction.clamp(0.0, 1.0);
    let cv_up = free * up_fraction;
    let cv_dn = free - cv_up;

    let spans = [
        fixed_spans[0], // dwell TDC
        fixed_spans[1], // ramp after TDC
        cv_up,
        fixed_spans[2], // ramp before BDC
        fixed_spans[3], // dwell BDC
        fixed_spans[4], // ramp after BDC
        cv_dn,
        fixed_spans[5], // ramp before TDC
    ];
    let mut bounds = [0.0; 8];
    let mut acc = 0.0;
    for (i, span) in spans.iter().enumerate() {
        acc = (acc + span).min(360.0);
        bounds[i] = acc;
    }
    SegmentPlan { bounds }
}

/// Unit-magnitude velocity/acceleration shape at one angle, split into the
/// compression (TDC→BDC) and expansion (BDC→TDC) halves. The expansion part
/// is later scaled by the (negative) expansion velocity.
#[derive(Debug, Clone, Copy, Default)]
struct ShapeSample {
    v_up: f64,
    a_up: f64,
    v_dn: f64,
    a_dn: f64,
}

fn shape_at(plan: &SegmentPlan, profile_kind: RampProfile, theta_deg: f64) -> ShapeSample {
    let [b1, b2, b3, b4, b5, b6, b7, b8] = plan.bounds;
    let mut out = ShapeSample::default();

    // Ramp contribution with `rising` selecting 0→1 or 1→0.
    let ramp = |start: f64, end: f64, rising: bool| -> (f64, f64) {
        let span = end - start;
        if span <= 0.0 {
            return (0.0, 0.0);
        }
        let u = ((theta_deg - start) / span).clamp(0.0, 1.0);
        let e = profile::eval(profile_kind, u);
        let slope = e.ds / (span * DEG_TO_RAD);
        if rising { (e.s, slope) } else { (1.0 - e.s, -slope) }
    };

    if theta_deg < b1 {
        // TDC dwell
    } else if theta_deg < b2 {
        (out.v_up, out.a_up) = ramp(b1, b2, true);
    } else if theta_deg < b3 {
        out.v_up = 1.0;
    } else if theta_deg < b4 {
        (out.v_up, out.a_up) = ramp(b3, b4, false);
    } else if theta_deg < b5 {
        // BDC dwell
    } else if theta_deg < b6 {
        (out.v_dn, out.a_dn) = ramp(b5, b6, true);
    } else if theta_deg < b7 {
        out.v_dn = 1.0;
    } else if theta_deg < b8 {
        (out.v_dn, out.a_dn) = ramp(b7, b8, false);
    }
    out
}

/// Trapezoidal integral of one channel over the full revolution, including
/// the uneven wrap step back to the (implied periodic) sample at 360°.
fn revolution_trapezoid(channel: &[f64], step_rad: f64, gap_rad: f64) -> f64 {
    let n = channel.len();
    let mut sum = 0.0;
    for k in 1..n {
        sum += 0.5 * (channel[k - 1] + channel[k]) * step_rad;
    }
    sum + 0.5 * (channel[n - 1] + channel[0]) * gap_rad
}

/// Synthesize the periodic displacement/velocity/acceleration table for one
/// revolution of the given parameter set.
///
/// Total over validated parameters; the only failure mode is parameter
/// rejection. Two calls with equal parameters produce identical tables.
pub fn synthesize(params: &CamParams) -> Result<MotionTable, ParamError> {
    params.validate()?;

    let step_deg = params.step_deg;
    let step_rad = step_deg * DEG_TO_RAD;
    let n = params.sample_count();
    let gap_rad = (360.0 - (n as f64 - 1.0) * step_deg) * DEG_TO_RAD;
    let plan = plan_segments(params);
    let profile_kind = params.profile;

    // Compression-side velocity magnitude from the continuous-domain stroke
    // balance: each ramp contributes span * area (or span * (1 - area)) and
    // the CV segment contributes its full span.
    let ramp_area = profile::integral(profile_kind, 1.0);
    let [b1, b2, b3, b4, ..] = plan.bounds;
    let ramp_in = (b2 - b1).max(0.0) * DEG_TO_RAD;
    let cv_up = (b3 - b2).max(0.0) * DEG_TO_RAD;
    let ramp_out = (b4 - b3).max(0.0) * DEG_TO_RAD;
    let denom_up = ramp_in * ramp_area + cv_up + ramp_out * (1.0 - ramp_area);
    let stroke = params.stroke_mm.max(0.0);
    let v_up = if denom_up > 0.0 { stroke / denom_up } else { 0.0 };

    // Evaluate the compression half at full magnitude and the expansion half
    // as a unit shape; the expansion magnitude is then solved so the
    // discrete revolution integral of velocity is exactly zero.
    let mut v_comp = vec![0.0; n];
    let mut a_comp = vec![0.0; n];
    let mut v_shape_dn = vec![0.0; n];
    let mut a_shape_dn = vec![0.0; n];
    for k in 0..n {
        let shape = shape_at(&plan, profile_kind, k as f64 * step_deg);
        v_comp[k] = v_up * shape.v_up;
        a_comp[k] = v_up * shape.a_up;
        v_shape_dn[k] = shape.v_dn;
        a_shape_dn[k] = shape.a_dn;
    }

    let up_area = revolution_trapezoid(&v_comp, step_rad, gap_rad);
    let dn_area = revolution_trapezoid(&v_shape_dn, step_rad, gap_rad);
    let v_dn = if dn_area > 0.0 { -up_area / dn_area } else { 0.0 };
    debug!(
        "motion law: n={n} bounds={:?} v_up={v_up:.6} v_dn={v_dn:.6}",
        plan.bounds
    );

    let mut v = vec![0.0; n];
    let mut a = vec![0.0; n];
    for k in 0..n {
        v[k] = v_comp[k] + v_dn * v_shape_dn[k];
        a[k] = a_comp[k] + v_dn * a_shape_dn[k];
    }

    let mut x = vec![0.0; n];
    for k in 1..n {
        x[k] = x[k - 1] + 0.5 * (v[k - 1] + v[k]) * step_rad;
    }

    wrap::apply(&plan, profile_kind, step_deg, &mut x, &mut v, &mut a);

    let samples = (0..n)
        .map(|k| MotionSample {
            theta_deg: k as f64 * step_deg,
            x_mm: x[k],
            v_mm_per_omega: v[k],
            a_mm_per_omega2: a[k],
        })
        .collect();
    Ok(MotionTable { step_deg, samples })
}
