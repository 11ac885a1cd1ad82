//! Query-time configuration for the router.
//!
//! # Environment Variables
//!
//! - `TRAILROUTE_SNAP_RADIUS_M`: maximum waypoint snapping distance (default: 500)
//! - `TRAILROUTE_BEARING_SAMPLE_M`: distance sampled either side of a junction
//!   when measuring turn angles (default: 50)

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Default maximum distance between a waypoint and the node it snaps to.
pub const DEFAULT_SNAP_RADIUS_M: f64 = 500.0;

/// Default distance sampled on each side of a junction for bearings.
pub const DEFAULT_BEARING_SAMPLE_M: f64 = 50.0;

/// Upper bounds (exclusive, in degrees of absolute bearing change) for each
/// turn bucket. Anything at or above `sharp` is a U-turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnThresholds {
    pub straight: f64,
    pub slight: f64,
    pub normal: f64,
    pub sharp: f64,
}

impl Default for TurnThresholds {
    fn default() -> Self {
        Self {
            straight: 15.0,
            slight: 45.0,
            normal: 135.0,
            sharp: 170.0,
        }
    }
}

/// Router settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub snap_radius_m: f64,
    pub bearing_sample_m: f64,
    pub turn_thresholds: TurnThresholds,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            snap_radius_m: DEFAULT_SNAP_RADIUS_M,
            bearing_sample_m: DEFAULT_BEARING_SAMPLE_M,
            turn_thresholds: TurnThresholds::default(),
        }
    }
}

impl RouterConfig {
    /// Defaults overridden by `TRAILROUTE_*` environment variables.
    ///
    /// Unparseable or non-positive values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(radius) = positive_env("TRAILROUTE_SNAP_RADIUS_M") {
            config.snap_radius_m = radius;
        }
        if let Some(sample) = positive_env("TRAILROUTE_BEARING_SAMPLE_M") {
            config.bearing_sample_m = sample;
        }
        config
    }

    pub fn with_snap_radius(mut self, radius_m: f64) -> Self {
        self.snap_radius_m = radius_m;
        self
    }

    /// Reject settings that would make routing meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.snap_radius_m.is_finite() || self.snap_radius_m < 0.0 {
            return Err(Error::InvalidRequest {
                message: format!(
                    "snap radius must be a non-negative number of metres, got {}",
                    self.snap_radius_m
                ),
            });
        }
        if !self.bearing_sample_m.is_finite() || self.bearing_sample_m <= 0.0 {
            return Err(Error::InvalidRequest {
                message: format!(
                    "bearing sample distance must be positive, got {}",
                    self.bearing_sample_m
                ),
            });
        }
        let t = self.turn_thresholds;
        let ordered = 0.0 <= t.straight
            && t.straight <= t.slight
            && t.slight <= t.normal
            && t.normal <= t.sharp
            && t.sharp <= 180.0;
        if !ordered {
            return Err(Error::InvalidRequest {
                message: "turn thresholds must increase from straight to sharp within 0-180"
                    .to_string(),
            });
        }
        Ok(())
    }
}

fn positive_env(name: &str) -> Option<f64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Some(value),
        _ => {
            warn!(variable = name, value = %raw, "ignoring invalid configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RouterConfig::default();
        assert_eq!(config.snap_radius_m, 500.0);
        assert_eq!(config.bearing_sample_m, 50.0);
        assert_eq!(config.turn_thresholds.straight, 15.0);
        assert_eq!(config.turn_thresholds.slight, 45.0);
        assert_eq!(config.turn_thresholds.normal, 135.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RouterConfig =
            serde_json::from_str(r#"{"snap_radius_m": 250.0}"#).expect("valid config");
        assert_eq!(config.snap_radius_m, 250.0);
        assert_eq!(config.bearing_sample_m, DEFAULT_BEARING_SAMPLE_M);
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let mut config = RouterConfig::default();
        config.turn_thresholds.slight = 150.0;
        assert!(config.validate().is_err());
        assert!(RouterConfig::default()
            .with_snap_radius(-1.0)
            .validate()
            .is_err());
    }
}
