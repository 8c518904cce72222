use thiserror::Error;

/// Parameter validation errors.
///
/// Copy + static field names for cheap propagation; produced by
/// [`crate::params::CamParams::validate`] before any synthesis work starts.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ParamError {
    #[error("up_fraction must be within [0, 1], got {0}")]
    UpFractionOutOfRange(f64),

    #[error("step_deg must be in (0, 120] so the grid holds at least 3 samples, got {0}")]
    StepOutOfRange(f64),

    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidSpan { name: &'static str, value: f64 },

    #[error("stroke_mm must be finite and non-negative, got {0}")]
    InvalidStroke(f64),

    #[error("journal_radius_mm must be positive, got {0}")]
    InvalidJournalRadius(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ParamError::UpFractionOutOfRange(1.5).to_string(),
            "up_fraction must be within [0, 1], got 1.5"
        );
        assert_eq!(
            ParamError::InvalidSpan {
                name: "dwell_tdc_deg",
                value: -2.0
            }
            .to_string(),
            "dwell_tdc_deg must be finite and non-negative, got -2"
        );
        assert_eq!(
            ParamError::InvalidJournalRadius(0.0).to_string(),
            "journal_radius_mm must be positive, got 0"
        );
    }

    #[test]
    fn param_error_is_copy() {
        let err = ParamError::InvalidStroke(-1.0);
        let err2 = err;
        assert_eq!(err, err2);
    }
}
