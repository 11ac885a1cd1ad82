//! Terrain-aware edge cost model.
//!
//! The cost of traversing an edge is expressed in "effort metres": one metre of
//! flat, paved, easy trail costs exactly 1.0. Surface, difficulty and path type
//! scale the distance; elevation gain and loss add per-metre penalties. The
//! model is pure and only runs while the graph is built. Searches sum the
//! precomputed results.
//!
//! Every multiplier is at least 1.0 and every penalty is non-negative, so an
//! edge never costs less than its length. The search heuristic relies on this.

mod profile;
mod tags;

pub use profile::{
    CostProfile, DescentPenalty, GradeMultipliers, HighwayMultipliers, SurfaceMultipliers,
};
pub use tags::{AccessRestriction, HighwayType, Surface, TechnicalGrade};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Sentinel cost for edges that must never enter the search frontier.
pub const IMPASSABLE: f64 = f64::INFINITY;

/// How the route will be travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    #[default]
    Hiking,
    Cycling,
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            TravelMode::Hiking => "hiking",
            TravelMode::Cycling => "cycling",
        };
        f.write_str(value)
    }
}

impl FromStr for TravelMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hiking" | "hike" | "foot" => Ok(TravelMode::Hiking),
            "cycling" | "bike" | "bicycle" => Ok(TravelMode::Cycling),
            other => Err(Error::InvalidRequest {
                message: format!("unknown travel mode '{other}'"),
            }),
        }
    }
}

/// Physical attributes of one directed traversal of a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentAttributes {
    pub distance_m: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub surface: Surface,
    pub highway: HighwayType,
    pub technical_grade: TechnicalGrade,
    pub access: AccessRestriction,
}

/// Cost of traversing a segment in `mode` using the built-in profile.
pub fn edge_cost(attributes: &SegmentAttributes, mode: TravelMode) -> f64 {
    CostProfile::for_mode(mode).edge_cost(attributes)
}

/// Estimated travel time in seconds for a summed route cost.
pub fn estimated_duration_s(total_cost: f64, mode: TravelMode) -> f64 {
    CostProfile::for_mode(mode).duration_s(total_cost)
}

impl CostProfile {
    /// Cost of one directed traversal. Returns [`IMPASSABLE`] when the mode may
    /// not use the segment; otherwise a finite value no smaller than the
    /// distance.
    pub fn edge_cost(&self, attributes: &SegmentAttributes) -> f64 {
        let distance = attributes.distance_m;
        if !attributes.access.allows(self.mode) || !distance.is_finite() || distance < 0.0 {
            return IMPASSABLE;
        }

        let multiplier = self.surface.get(attributes.surface)
            * self.grade.get(attributes.technical_grade)
            * self.highway.get(attributes.highway);
        if !multiplier.is_finite() {
            return IMPASSABLE;
        }

        let gain = non_negative(attributes.elevation_gain_m);
        let loss = non_negative(attributes.elevation_loss_m);
        let descent_grade = if loss == 0.0 {
            0.0
        } else if distance == 0.0 {
            f64::INFINITY
        } else {
            loss / distance
        };

        distance * multiplier
            + gain * self.climb_penalty_per_m
            + loss * self.descent.per_meter(descent_grade)
    }

    pub fn duration_s(&self, total_cost: f64) -> f64 {
        total_cost / self.base_speed_mps
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
