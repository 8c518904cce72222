//! Reference-curve lookup for ratio calibration.
//!
//! An external kinematics source may publish the exact ring angle φ(θ) for a
//! parameter set. Calibration is strictly best-effort: every failure mode
//! (no file, unreadable file, malformed contents) resolves to `None` and the
//! caller keeps its geometry-derived curve.

use std::fs;
use std::path::PathBuf;

use camcore::{CamParams, ReferenceCurve};
use log::debug;

/// Source of reference angular curves, keyed by the motion-law parameters.
pub trait ReferenceCurveProvider {
    /// Best-effort lookup; `None` means no calibration data is available.
    fn reference_curve(&self, params: &CamParams) -> Option<ReferenceCurve>;
}

/// Provider with no data; calibration is skipped entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReference;

impl ReferenceCurveProvider for NoReference {
    fn reference_curve(&self, _params: &CamParams) -> Option<ReferenceCurve> {
        None
    }
}

/// Loads reference curves from JSON files under a root directory.
///
/// The file for a parameter set is `ref_<key>.json` with the key from
/// [`CamParams::reference_key`]; contents deserialize into
/// [`ReferenceCurve`].
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    root: PathBuf,
}

impl JsonFileProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonFileProvider { root: root.into() }
    }

    /// Path the curve for `params` would be read from.
    pub fn table_path(&self, params: &CamParams) -> PathBuf {
        self.root
            .join(format!("ref_{}.json", params.reference_key()))
    }
}

impl ReferenceCurveProvider for JsonFileProvider {
    fn reference_curve(&self, params: &CamParams) -> Option<ReferenceCurve> {
        let path = self.table_path(params);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                debug!("no reference curve at {}: {err}", path.display());
                return None;
            }
        };
        let curve: ReferenceCurve = match serde_json::from_str(&text) {
            Ok(curve) => curve,
            Err(err) => {
                debug!("unreadable reference curve {}: {err}", path.display());
                return None;
            }
        };
        if curve.theta_deg.is_empty() || curve.theta_deg.len() != curve.phi_deg.len() {
            debug!(
                "reference curve {} has mismatched grids ({} vs {})",
                path.display(),
                curve.theta_deg.len(),
                curve.phi_deg.len()
            );
            return None;
        }
        Some(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("camref-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_yields_none() {
        let provider = JsonFileProvider::new(temp_root("missing"));
        assert!(provider.reference_curve(&CamParams::default()).is_none());
    }

    #[test]
    fn well_formed_file_round_trips() {
        let root = temp_root("ok");
        let provider = JsonFileProvider::new(root.clone());
        let params = CamParams::default();
        let curve = ReferenceCurve {
            theta_deg: vec![0.0, 120.0, 240.0],
            phi_deg: vec![0.0, 120.0, 240.0],
        };
        fs::write(
            provider.table_path(&params),
            serde_json::to_string(&curve).unwrap(),
        )
        .unwrap();
        assert_eq!(provider.reference_curve(&params), Some(curve));
    }

    #[test]
    fn malformed_json_yields_none() {
        let root = temp_root("bad");
        let provider = JsonFileProvider::new(root.clone());
        let params = CamParams::default();
        fs::write(provider.table_path(&params), "{not json").unwrap();
        assert!(provider.reference_curve(&params).is_none());
    }

    #[test]
    fn mismatched_grids_yield_none() {
        let root = temp_root("mismatch");
        let provider = JsonFileProvider::new(root.clone());
        let params = CamParams::default();
        let text = r#"{"theta_deg": [0.0, 1.0], "phi_deg": [0.0]}"#;
        fs::write(provider.table_path(&params), text).unwrap();
        assert!(provider.reference_curve(&params).is_none());
    }
}
