//! Per-mode cost constants.
//!
//! Every number the cost model uses lives in one of the `const` profiles below.
//! Changing a value here changes the cost of every edge built afterwards, so
//! graphs built with different constants are not comparable.

use serde::Serialize;

use super::tags::{HighwayType, Surface, TechnicalGrade};
use super::{TravelMode, IMPASSABLE};

/// Multipliers applied to distance by surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurfaceMultipliers {
    pub paved: f64,
    pub compacted: f64,
    pub fine_gravel: f64,
    pub gravel: f64,
    pub ground: f64,
    pub grass: f64,
    pub rock: f64,
    pub sand: f64,
    pub mud: f64,
    pub unknown: f64,
}

impl SurfaceMultipliers {
    pub fn get(&self, surface: Surface) -> f64 {
        match surface {
            Surface::Paved => self.paved,
            Surface::Compacted => self.compacted,
            Surface::FineGravel => self.fine_gravel,
            Surface::Gravel => self.gravel,
            Surface::Ground => self.ground,
            Surface::Grass => self.grass,
            Surface::Rock => self.rock,
            Surface::Sand => self.sand,
            Surface::Mud => self.mud,
            Surface::Unknown => self.unknown,
        }
    }
}

/// Multipliers applied to distance by SAC grade. [`IMPASSABLE`] bars the grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradeMultipliers {
    pub hiking: f64,
    pub mountain_hiking: f64,
    pub demanding_mountain_hiking: f64,
    pub alpine_hiking: f64,
    pub demanding_alpine_hiking: f64,
    pub difficult_alpine_hiking: f64,
}

impl GradeMultipliers {
    pub fn get(&self, grade: TechnicalGrade) -> f64 {
        match grade {
            TechnicalGrade::Hiking => self.hiking,
            TechnicalGrade::MountainHiking => self.mountain_hiking,
            TechnicalGrade::DemandingMountainHiking => self.demanding_mountain_hiking,
            TechnicalGrade::AlpineHiking => self.alpine_hiking,
            TechnicalGrade::DemandingAlpineHiking => self.demanding_alpine_hiking,
            TechnicalGrade::DifficultAlpineHiking => self.difficult_alpine_hiking,
        }
    }
}

/// Multipliers applied to distance by path classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HighwayMultipliers {
    pub path: f64,
    pub footway: f64,
    pub track: f64,
    pub cycleway: f64,
    pub bridleway: f64,
    pub steps: f64,
    pub road: f64,
    pub other: f64,
}

impl HighwayMultipliers {
    pub fn get(&self, highway: HighwayType) -> f64 {
        match highway {
            HighwayType::Path => self.path,
            HighwayType::Footway => self.footway,
            HighwayType::Track => self.track,
            HighwayType::Cycleway => self.cycleway,
            HighwayType::Bridleway => self.bridleway,
            HighwayType::Steps => self.steps,
            HighwayType::Road => self.road,
            HighwayType::Other => self.other,
        }
    }
}

/// Piecewise descent penalty keyed on descent grade (loss / distance).
///
/// Below `shallow_grade` descending is free. Between `shallow_grade` and
/// `steep_grade` the per-metre penalty rises linearly from zero to
/// `moderate_max_per_m`. At or above `steep_grade` it jumps to
/// `steep_per_m`, which must exceed the climb penalty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DescentPenalty {
    pub shallow_grade: f64,
    pub steep_grade: f64,
    pub moderate_max_per_m: f64,
    pub steep_per_m: f64,
}

impl DescentPenalty {
    pub fn per_meter(&self, grade: f64) -> f64 {
        if grade.is_nan() || grade < self.shallow_grade {
            0.0
        } else if grade < self.steep_grade {
            let span = self.steep_grade - self.shallow_grade;
            self.moderate_max_per_m * (grade - self.shallow_grade) / span
        } else {
            self.steep_per_m
        }
    }
}

/// Complete set of cost constants for one travel mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostProfile {
    pub mode: TravelMode,
    /// Flat-ground, paved, easy travel speed used to turn cost into duration.
    pub base_speed_mps: f64,
    pub surface: SurfaceMultipliers,
    pub grade: GradeMultipliers,
    pub highway: HighwayMultipliers,
    /// Cost added per metre of elevation gained (Naismith-style).
    pub climb_penalty_per_m: f64,
    pub descent: DescentPenalty,
}

impl CostProfile {
    /// 5 km/h walking; Naismith's 10 minutes per 100 m climbed is 600 m of
    /// flat walking per 100 m, rounded down to 8 m per metre to stay below
    /// steep descents.
    pub const HIKING: CostProfile = CostProfile {
        mode: TravelMode::Hiking,
        base_speed_mps: 5000.0 / 3600.0,
        surface: SurfaceMultipliers {
            paved: 1.0,
            compacted: 1.1,
            fine_gravel: 1.15,
            gravel: 1.2,
            ground: 1.3,
            grass: 1.4,
            rock: 1.5,
            sand: 1.8,
            mud: 2.0,
            unknown: 1.25,
        },
        grade: GradeMultipliers {
            hiking: 1.0,
            mountain_hiking: 1.5,
            demanding_mountain_hiking: 2.0,
            alpine_hiking: 3.0,
            demanding_alpine_hiking: 4.0,
            difficult_alpine_hiking: 5.0,
        },
        highway: HighwayMultipliers {
            path: 1.0,
            footway: 1.0,
            track: 1.0,
            cycleway: 1.05,
            bridleway: 1.0,
            steps: 1.15,
            road: 1.1,
            other: 1.0,
        },
        climb_penalty_per_m: 8.0,
        descent: DescentPenalty {
            shallow_grade: 0.05,
            steep_grade: 0.25,
            moderate_max_per_m: 4.0,
            steep_per_m: 10.0,
        },
    };

    /// 15 km/h touring on a mountain bike. Loose surfaces hurt far more than
    /// on foot, stairs and alpine grades are not rideable.
    pub const CYCLING: CostProfile = CostProfile {
        mode: TravelMode::Cycling,
        base_speed_mps: 15_000.0 / 3600.0,
        surface: SurfaceMultipliers {
            paved: 1.0,
            compacted: 1.3,
            fine_gravel: 1.4,
            gravel: 1.6,
            ground: 1.8,
            grass: 2.2,
            rock: 3.0,
            sand: 3.5,
            mud: 4.0,
            unknown: 1.6,
        },
        grade: GradeMultipliers {
            hiking: 1.0,
            mountain_hiking: 2.0,
            demanding_mountain_hiking: 3.5,
            alpine_hiking: IMPASSABLE,
            demanding_alpine_hiking: IMPASSABLE,
            difficult_alpine_hiking: IMPASSABLE,
        },
        highway: HighwayMultipliers {
            path: 1.15,
            footway: 1.2,
            track: 1.0,
            cycleway: 1.0,
            bridleway: 1.2,
            steps: IMPASSABLE,
            road: 1.0,
            other: 1.1,
        },
        climb_penalty_per_m: 12.0,
        descent: DescentPenalty {
            shallow_grade: 0.05,
            steep_grade: 0.25,
            moderate_max_per_m: 2.0,
            steep_per_m: 14.0,
        },
    };

    pub fn for_mode(mode: TravelMode) -> &'static CostProfile {
        match mode {
            TravelMode::Hiking => &Self::HIKING,
            TravelMode::Cycling => &Self::CYCLING,
        }
    }
}
