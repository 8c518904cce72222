use serde::{Deserialize, Serialize};

/// One sample of the synthesized motion law.
///
/// Velocity and acceleration are normalized per unit angular rate, so the
/// table is valid for any rotation speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Cam angle in degrees.
    pub theta_deg: f64,
    /// Follower displacement in mm.
    pub x_mm: f64,
    /// Follower velocity in mm per unit angular rate.
    pub v_mm_per_omega: f64,
    /// Follower acceleration in mm per unit angular rate squared.
    pub a_mm_per_omega2: f64,
}

/// Sampled motion law over one full revolution.
///
/// Samples sit at k * step_deg for k in 0..n with n = round(360 / step_deg);
/// the value at 360 degrees is implied equal to sample 0 and never stored.
/// The final stored step may therefore be shorter or longer than `step_deg`
/// when the step does not divide 360 exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionTable {
    /// Nominal grid step in degrees.
    pub step_deg: f64,
    /// Ordered samples for one revolution, theta strictly increasing.
    pub samples: Vec<MotionSample>,
}

impl MotionTable {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Angular gap between the last stored sample and the implied sample at
    /// 360 degrees.
    pub fn wrap_gap_deg(&self) -> f64 {
        match self.samples.last() {
            Some(last) => 360.0 - last.theta_deg,
            None => 360.0,
        }
    }

    /// Ratio of the wrap gap to the nominal step; 1.0 on an exact grid.
    pub fn wrap_ratio(&self) -> f64 {
        self.wrap_gap_deg() / self.step_deg
    }
}

/// Transmission ratio curve and prototype pitch curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionTables {
    /// (theta_deg, instantaneous ratio) pairs, parallel to the motion table.
    pub ratio: Vec<(f64, f64)>,
    /// (s, radius_mm) pairs of the planet pitch prototype for s in [0, 1].
    pub pitch_planet: Vec<(f64, f64)>,
    /// (s, radius_mm) pairs of the ring pitch prototype for s in [0, 1].
    pub pitch_ring: Vec<(f64, f64)>,
    /// RMS mismatch of the normalized cumulative cam/ring arc-length curves.
    pub arc_length_residual_rms: f64,
}

/// Externally supplied reference angular curve φ(θ), used to calibrate the
/// transmission ratio when available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCurve {
    /// Cam angle grid in degrees.
    pub theta_deg: Vec<f64>,
    /// Reference angle φ at each grid point, degrees.
    pub phi_deg: Vec<f64>,
}
