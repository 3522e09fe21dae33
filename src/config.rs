use crate::domain::geofence::DEFAULT_RADIUS_M;
use crate::error::{ReconcileError, Result};

/// Tunables of the reconciliation engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Geofence radius for locations registered without one, in meters.
    pub default_radius_m: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_radius_m: DEFAULT_RADIUS_M,
        }
    }
}

impl EngineConfig {
    pub fn with_default_radius(default_radius_m: f64) -> Result<Self> {
        if !default_radius_m.is_finite() || default_radius_m <= 0.0 {
            return Err(ReconcileError::validation(format!(
                "default radius must be a positive number of meters, got {}",
                default_radius_m
            )));
        }
        Ok(Self { default_radius_m })
    }
}
