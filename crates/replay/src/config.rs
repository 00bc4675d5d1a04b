use std::path::Path;

use mechanics::VehicleModelParams;
use serde::{Deserialize, Serialize};
use simcore::IntegrationScheme;

use crate::error::ReplayError;

/// Replay settings. Every field has a default, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub vehicle: VehicleModelParams,
    /// Horizon discretization; `None` takes the width of the control log.
    pub horizon_steps: Option<usize>,
    /// Prediction horizon in seconds.
    pub predict_duration: f64,
    /// Padding added to each side of the global plot extent, in plot units.
    pub margin: f64,
    pub skip_frames: usize,
    pub integration: IntegrationScheme,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            vehicle: VehicleModelParams::default(),
            horizon_steps: None,
            predict_duration: 0.1,
            margin: 0.1,
            skip_frames: 1,
            integration: IntegrationScheme::ExplicitEuler,
        }
    }
}

impl ReplayConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let text = std::fs::read_to_string(path).map_err(|e| ReplayError::io(path, e))?;
        Self::from_json_str(&text)
    }
}
