use serde::{Deserialize, Serialize};

use crate::error::ParamError;

/// Normalized ramp shape used on every ramp segment of the motion cycle.
///
/// All variants satisfy p(0) = 0, p(1) = 1 and p'(0) = p'(1) = 0, so ramps
/// blend into the adjacent dwell / constant-velocity segments without a
/// velocity step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RampProfile {
    /// Cosine-based ramp, C1 at the endpoints.
    Cycloidal,
    /// Quintic smoothstep, zero first and second derivative at the ends.
    #[default]
    Quintic,
    /// Seventh-degree smoothstep, zero first through third derivative.
    Septic,
}

impl RampProfile {
    /// Short stable tag used when keying external tables.
    pub fn tag(self) -> &'static str {
        match self {
            RampProfile::Cycloidal => "cyc",
            RampProfile::Quintic => "s5",
            RampProfile::Septic => "s7",
        }
    }
}

/// Geometry constants consumed only by the transmission/pitch stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryParams {
    /// Slider axis angle γ in degrees.
    pub slider_axis_deg: f64,
    /// Journal phase angle β in degrees.
    pub journal_phase_deg: f64,
    /// Journal radius R in mm.
    pub journal_radius_mm: f64,
    /// Planet pitch prototype intercept r0 in mm.
    pub planet_r0_mm: f64,
    /// Planet pitch prototype slope k in mm per unit s.
    pub planet_k_mm: f64,
    /// Ring pitch prototype bias in mm.
    pub ring_bias_mm: f64,
    /// Ring pitch prototype slope in mm per unit s.
    pub ring_scale_mm: f64,
}

impl Default for GeometryParams {
    fn default() -> Self {
        GeometryParams {
            slider_axis_deg: 0.0,
            journal_phase_deg: 0.0,
            journal_radius_mm: 5.0,
            planet_r0_mm: 40.0,
            planet_k_mm: 1.0,
            ring_bias_mm: 50.0,
            ring_scale_mm: 1.0,
        }
    }
}

/// User parameters for one synthesis call.
///
/// Angular quantities are degrees; the eight-segment cycle is
/// dwell at TDC, ramp, constant-velocity compression, ramp into BDC,
/// dwell at BDC, ramp, constant-velocity expansion, ramp back into TDC.
/// The two constant-velocity spans share whatever angle is left over after
/// the dwells and ramps, split by `up_fraction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CamParams {
    /// Stroke length in mm.
    pub stroke_mm: f64,
    /// Dwell at top dead center, degrees.
    pub dwell_tdc_deg: f64,
    /// Dwell at bottom dead center, degrees.
    pub dwell_bdc_deg: f64,
    /// Ramp leading into TDC, degrees.
    pub ramp_before_tdc_deg: f64,
    /// Ramp leaving TDC, degrees.
    pub ramp_after_tdc_deg: f64,
    /// Ramp leading into BDC, degrees.
    pub ramp_before_bdc_deg: f64,
    /// Ramp leaving BDC, degrees.
    pub ramp_after_bdc_deg: f64,
    /// Compression-side share of the free constant-velocity angle, in [0, 1].
    pub up_fraction: f64,
    /// Sampling step in degrees.
    pub step_deg: f64,
    /// Ramp shape applied to every ramp segment.
    pub profile: RampProfile,
    /// Geometry constants for the transmission/pitch stage.
    pub geometry: GeometryParams,
}

impl Default for CamParams {
    fn default() -> Self {
        CamParams {
            stroke_mm: 20.0,
            dwell_tdc_deg: 20.0,
            dwell_bdc_deg: 20.0,
            ramp_before_tdc_deg: 10.0,
            ramp_after_tdc_deg: 10.0,
            ramp_before_bdc_deg: 10.0,
            ramp_after_bdc_deg: 10.0,
            up_fraction: 0.5,
            step_deg: 0.5,
            profile: RampProfile::default(),
            geometry: GeometryParams::default(),
        }
    }
}

impl CamParams {
    /// Validate the parameter set for synthesis.
    pub fn validate(&self) -> Result<(), ParamError> {
        if !(0.0..=1.0).contains(&self.up_fraction) {
            return Err(ParamError::UpFractionOutOfRange(self.up_fraction));
        }
        if !self.step_deg.is_finite() || self.step_deg <= 0.0 || self.step_deg > 120.0 {
            return Err(ParamError::StepOutOfRange(self.step_deg));
        }
        if !self.stroke_mm.is_finite() || self.stroke_mm < 0.0 {
            return Err(ParamError::InvalidStroke(self.stroke_mm));
        }
        for (name, value) in [
            ("dwell_tdc_deg", self.dwell_tdc_deg),
            ("dwell_bdc_deg", self.dwell_bdc_deg),
            ("ramp_before_tdc_deg", self.ramp_before_tdc_deg),
            ("ramp_after_tdc_deg", self.ramp_after_tdc_deg),
            ("ramp_before_bdc_deg", self.ramp_before_bdc_deg),
            ("ramp_after_bdc_deg", self.ramp_after_bdc_deg),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ParamError::InvalidSpan { name, value });
            }
        }
        if !self.geometry.journal_radius_mm.is_finite() || self.geometry.journal_radius_mm <= 0.0 {
            return Err(ParamError::InvalidJournalRadius(self.geometry.journal_radius_mm));
        }
        Ok(())
    }

    /// Number of samples on the [0, 360) grid for this step.
    pub fn sample_count(&self) -> usize {
        (360.0 / self.step_deg).round() as usize
    }

    /// Stable key identifying the motion-law parameter set.
    ///
    /// Used to look up externally supplied reference tables; geometry
    /// constants do not affect the motion law and are excluded.
    pub fn reference_key(&self) -> String {
        format!(
            "{}_{:.3}_{:.3}_{:.3}_{:.3}_{:.3}_{:.3}_{:.3}_{:.3}_{:.3}",
            self.profile.tag(),
            self.stroke_mm,
            self.dwell_tdc_deg,
            self.dwell_bdc_deg,
            self.ramp_before_tdc_deg,
            self.ramp_after_tdc_deg,
            self.ramp_before_bdc_deg,
            self.ramp_after_bdc_deg,
            self.up_fraction,
            self.step_deg,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_valid() {
        assert!(CamParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_up_fraction() {
        let mut p = CamParams::default();
        p.up_fraction = 1.2;
        assert!(matches!(
            p.validate(),
            Err(ParamError::UpFractionOutOfRange(_))
        ));
    }

    #[test]
    fn rejects_degenerate_step() {
        let mut p = CamParams::default();
        p.step_deg = 0.0;
        assert!(matches!(p.validate(), Err(ParamError::StepOutOfRange(_))));
        // A step over 120 degrees would leave fewer than 3 samples.
        p.step_deg = 150.0;
        assert!(matches!(p.validate(), Err(ParamError::StepOutOfRange(_))));
    }

    #[test]
    fn rejects_negative_spans() {
        let mut p = CamParams::default();
        p.ramp_after_bdc_deg = -1.0;
        assert!(matches!(p.validate(), Err(ParamError::InvalidSpan { .. })));
    }

    #[test]
    fn rejects_non_positive_journal_radius() {
        let mut p = CamParams::default();
        p.geometry.journal_radius_mm = 0.0;
        assert!(matches!(
            p.validate(),
            Err(ParamError::InvalidJournalRadius(_))
        ));
    }

    #[test]
    fn sample_count_rounds_the_ratio() {
        let mut p = CamParams::default();
        p.step_deg = 1.0;
        assert_eq!(p.sample_count(), 360);
        p.step_deg = 0.7;
        assert_eq!(p.sample_count(), 514);
    }

    #[test]
    fn reference_key_distinguishes_motion_parameters() {
        let a = CamParams::default();
        let mut b = CamParams::default();
        b.up_fraction = 0.8;
        assert_ne!(a.reference_key(), b.reference_key());

        // Geometry constants do not participate in the key.
        let mut c = CamParams::default();
        c.geometry.journal_radius_mm = 9.0;
        assert_eq!(a.reference_key(), c.reference_key());
    }

    #[test]
    fn params_round_trip_through_json() {
        let p = CamParams::default();
        let text = serde_json::to_string(&p).unwrap();
        let back: CamParams = serde_json::from_str(&text).unwrap();
        assert_eq!(p, back);
    }
}
