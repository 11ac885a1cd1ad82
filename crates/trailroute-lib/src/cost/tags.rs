//! Classification of raw trail tags into the enums the cost model understands.
//!
//! Each enum has a canonical `as_str` value that is also what gets persisted,
//! and `from_tag` accepts those canonical values plus the common OSM synonyms.

use std::fmt;

use serde::Serialize;

use super::TravelMode;

/// Walking or riding surface of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Paved,
    Compacted,
    FineGravel,
    Gravel,
    Ground,
    Grass,
    Rock,
    Sand,
    Mud,
    #[default]
    Unknown,
}

impl Surface {
    pub fn from_tag(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Surface::Unknown;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "paved" | "asphalt" | "concrete" | "concrete:plates" | "concrete:lanes"
            | "paving_stones" | "sett" | "metal" | "wood" => Surface::Paved,
            "compacted" => Surface::Compacted,
            "fine_gravel" => Surface::FineGravel,
            "gravel" | "pebblestone" | "unpaved" => Surface::Gravel,
            "ground" | "dirt" | "earth" | "soil" => Surface::Ground,
            "grass" | "grass_paver" => Surface::Grass,
            "rock" | "stone" | "bare_rock" | "scree" => Surface::Rock,
            "sand" => Surface::Sand,
            "mud" => Surface::Mud,
            _ => Surface::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Surface::Paved => "paved",
            Surface::Compacted => "compacted",
            Surface::FineGravel => "fine_gravel",
            Surface::Gravel => "gravel",
            Surface::Ground => "ground",
            Surface::Grass => "grass",
            Surface::Rock => "rock",
            Surface::Sand => "sand",
            Surface::Mud => "mud",
            Surface::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path classification taken from the `highway` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HighwayType {
    Path,
    Footway,
    Track,
    Cycleway,
    Bridleway,
    Steps,
    Road,
    #[default]
    Other,
}

impl HighwayType {
    pub fn from_tag(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return HighwayType::Other;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "path" => HighwayType::Path,
            "footway" | "pedestrian" => HighwayType::Footway,
            "track" => HighwayType::Track,
            "cycleway" => HighwayType::Cycleway,
            "bridleway" => HighwayType::Bridleway,
            "steps" => HighwayType::Steps,
            "road" | "residential" | "service" | "unclassified" | "tertiary" | "living_street" => {
                HighwayType::Road
            }
            _ => HighwayType::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HighwayType::Path => "path",
            HighwayType::Footway => "footway",
            HighwayType::Track => "track",
            HighwayType::Cycleway => "cycleway",
            HighwayType::Bridleway => "bridleway",
            HighwayType::Steps => "steps",
            HighwayType::Road => "road",
            HighwayType::Other => "other",
        }
    }
}

impl fmt::Display for HighwayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trail difficulty on the SAC hiking scale (`sac_scale` tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalGrade {
    /// T1, also used when the tag is absent.
    #[default]
    Hiking,
    MountainHiking,
    DemandingMountainHiking,
    AlpineHiking,
    DemandingAlpineHiking,
    DifficultAlpineHiking,
}

impl TechnicalGrade {
    pub fn from_tag(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return TechnicalGrade::Hiking;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "mountain_hiking" | "t2" => TechnicalGrade::MountainHiking,
            "demanding_mountain_hiking" | "t3" => TechnicalGrade::DemandingMountainHiking,
            "alpine_hiking" | "t4" => TechnicalGrade::AlpineHiking,
            "demanding_alpine_hiking" | "t5" => TechnicalGrade::DemandingAlpineHiking,
            "difficult_alpine_hiking" | "t6" => TechnicalGrade::DifficultAlpineHiking,
            _ => TechnicalGrade::Hiking,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TechnicalGrade::Hiking => "hiking",
            TechnicalGrade::MountainHiking => "mountain_hiking",
            TechnicalGrade::DemandingMountainHiking => "demanding_mountain_hiking",
            TechnicalGrade::AlpineHiking => "alpine_hiking",
            TechnicalGrade::DemandingAlpineHiking => "demanding_alpine_hiking",
            TechnicalGrade::DifficultAlpineHiking => "difficult_alpine_hiking",
        }
    }
}

impl fmt::Display for TechnicalGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which travel modes a segment's access tags permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessRestriction {
    pub hiking: bool,
    pub cycling: bool,
}

impl Default for AccessRestriction {
    fn default() -> Self {
        Self::OPEN
    }
}

impl AccessRestriction {
    pub const OPEN: AccessRestriction = AccessRestriction {
        hiking: true,
        cycling: true,
    };

    /// Derive access from the generic `access` tag and the mode-specific
    /// `foot`/`bicycle` tags. A mode-specific value overrides the generic one.
    pub fn from_tags(access: Option<&str>, foot: Option<&str>, bicycle: Option<&str>) -> Self {
        let general = access.map(permits).unwrap_or(true);
        Self {
            hiking: foot.map(permits).unwrap_or(general),
            cycling: bicycle.map(permits).unwrap_or(general),
        }
    }

    pub fn allows(&self, mode: TravelMode) -> bool {
        match mode {
            TravelMode::Hiking => self.hiking,
            TravelMode::Cycling => self.cycling,
        }
    }
}

fn permits(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "no" | "private" | "use_sidepath" | "dismount"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_synonyms_collapse() {
        assert_eq!(Surface::from_tag(Some("asphalt")), Surface::Paved);
        assert_eq!(Surface::from_tag(Some("Dirt")), Surface::Ground);
        assert_eq!(Surface::from_tag(Some("lava")), Surface::Unknown);
        assert_eq!(Surface::from_tag(None), Surface::Unknown);
    }

    #[test]
    fn canonical_names_round_trip() {
        for surface in [
            Surface::Paved,
            Surface::Compacted,
            Surface::FineGravel,
            Surface::Gravel,
            Surface::Ground,
            Surface::Grass,
            Surface::Rock,
            Surface::Sand,
            Surface::Mud,
            Surface::Unknown,
        ] {
            assert_eq!(Surface::from_tag(Some(surface.as_str())), surface);
        }
        for grade in [
            TechnicalGrade::Hiking,
            TechnicalGrade::MountainHiking,
            TechnicalGrade::DemandingMountainHiking,
            TechnicalGrade::AlpineHiking,
            TechnicalGrade::DemandingAlpineHiking,
            TechnicalGrade::DifficultAlpineHiking,
        ] {
            assert_eq!(TechnicalGrade::from_tag(Some(grade.as_str())), grade);
        }
        assert_eq!(HighwayType::from_tag(Some("steps")), HighwayType::Steps);
        assert_eq!(HighwayType::from_tag(Some("other")), HighwayType::Other);
    }

    #[test]
    fn mode_specific_access_overrides_general() {
        let access = AccessRestriction::from_tags(Some("no"), Some("yes"), None);
        assert!(access.allows(TravelMode::Hiking));
        assert!(!access.allows(TravelMode::Cycling));

        let access = AccessRestriction::from_tags(None, None, Some("no"));
        assert!(access.allows(TravelMode::Hiking));
        assert!(!access.allows(TravelMode::Cycling));
    }
}
