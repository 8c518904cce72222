//! Structural and numerical soundness checks for a produced motion table.
//!
//! The checker is stateless and never mutates the table; callers decide
//! whether a failed item is fatal. Export tooling serializes the report
//! as-is.

use camcore::MotionTable;
use serde::Serialize;

/// One named pass/fail item.
#[derive(Debug, Clone, Serialize)]
pub struct CheckItem {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl CheckItem {
    fn new(name: &'static str, passed: bool, detail: String) -> Self {
        CheckItem {
            name,
            passed,
            detail,
        }
    }
}

/// Full report: the individual items plus the aggregate flag.
#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub checks: Vec<CheckItem>,
    pub passed: bool,
}

// Absolute tolerance floors for the per-channel wrap checks; each is
// combined with a relative term on the channel's largest magnitude.
const WRAP_REL_TOL: f64 = 1e-9;
const WRAP_ABS_FLOOR_X: f64 = 1e-11;
const WRAP_ABS_FLOOR_V: f64 = 1e-11;
const WRAP_ABS_FLOOR_A: f64 = 1e-9;

/// Run every check against the table.
pub fn preflight(table: &MotionTable) -> PreflightReport {
    let n = table.len();
    let mut checks = Vec::with_capacity(7);

    checks.push(CheckItem::new(
        "sample_count",
        n >= 3,
        format!("{n} samples"),
    ));

    let mut grid_ok = !table.is_empty() && table.samples[0].theta_deg == 0.0;
    let mut grid_detail = String::from("theta starts at 0 and increases strictly");
    if table.is_empty() {
        grid_detail = "empty table".into();
    } else if table.samples[0].theta_deg != 0.0 {
        grid_detail = format!("theta[0] = {}", table.samples[0].theta_deg);
    }
    for (k, w) in table.samples.windows(2).enumerate() {
        if !(w[1].theta_deg > w[0].theta_deg) {
            grid_ok = false;
            grid_detail = format!(
                "theta not strictly increasing at index {}: {} -> {}",
                k + 1,
                w[0].theta_deg,
                w[1].theta_deg
            );
            break;
        }
    }
    if grid_ok && table.samples.iter().any(|s| s.theta_deg > 360.0) {
        grid_ok = false;
        grid_detail = "theta exceeds 360".into();
    }
    checks.push(CheckItem::new("theta_grid", grid_ok, grid_detail));

    let ratio = 360.0 / table.step_deg;
    let drift = (ratio - ratio.round()).abs();
    checks.push(CheckItem::new(
        "step_divides_revolution",
        drift <= 1e-9,
        format!("360/{} deviates from integer by {drift:.3e}", table.step_deg),
    ));

    let finite = table.samples.iter().all(|s| {
        s.theta_deg.is_finite()
            && s.x_mm.is_finite()
            && s.v_mm_per_omega.is_finite()
            && s.a_mm_per_omega2.is_finite()
    });
    checks.push(CheckItem::new(
        "finite_channels",
        finite,
        if finite {
            "no NaN or infinite values".into()
        } else {
            "table contains NaN or infinite values".into()
        },
    ));

    checks.push(wrap_check(
        "wrap_displacement",
        table,
        WRAP_ABS_FLOOR_X,
        |s| s.x_mm,
    ));
    checks.push(wrap_check("wrap_velocity", table, WRAP_ABS_FLOOR_V, |s| {
        s.v_mm_per_omega
    }));
    checks.push(wrap_check(
        "wrap_acceleration",
        table,
        WRAP_ABS_FLOOR_A,
        |s| s.a_mm_per_omega2,
    ));

    let passed = checks.iter().all(|c| c.passed);
    PreflightReport { checks, passed }
}

fn wrap_check(
    name: &'static str,
    table: &MotionTable,
    abs_floor: f64,
    channel: impl Fn(&camcore::MotionSample) -> f64,
) -> CheckItem {
    let n = table.len();
    if n < 2 {
        return CheckItem::new(name, false, "not enough samples to extrapolate".into());
    }
    let rho = table.wrap_ratio();
    let last = channel(&table.samples[n - 1]);
    let prev = channel(&table.samples[n - 2]);
    let first = channel(&table.samples[0]);
    let extrapolated = (1.0 + rho) * last - rho * prev;
    let max_abs = table
        .samples
        .iter()
        .fold(0.0_f64, |m, s| m.max(channel(s).abs()));
    let tol = abs_floor.max(WRAP_REL_TOL * max_abs);
    let miss = (extrapolated - first).abs();
    CheckItem::new(
        name,
        miss <= tol,
        format!("wrap miss {miss:.3e} vs tolerance {tol:.3e}"),
    )
}
