use approx::assert_relative_eq;
use trailroute_lib::{
    edge_cost, estimated_duration_s, AccessRestriction, CostProfile, HighwayType,
    SegmentAttributes, Surface, TechnicalGrade, TravelMode,
};

const SURFACES: [Surface; 10] = [
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
];

const HIGHWAYS: [HighwayType; 8] = [
    HighwayType::Path,
    HighwayType::Footway,
    HighwayType::Track,
    HighwayType::Cycleway,
    HighwayType::Bridleway,
    HighwayType::Steps,
    HighwayType::Road,
    HighwayType::Other,
];

const GRADES: [TechnicalGrade; 6] = [
    TechnicalGrade::Hiking,
    TechnicalGrade::MountainHiking,
    TechnicalGrade::DemandingMountainHiking,
    TechnicalGrade::AlpineHiking,
    TechnicalGrade::DemandingAlpineHiking,
    TechnicalGrade::DifficultAlpineHiking,
];

fn segment(distance_m: f64) -> SegmentAttributes {
    SegmentAttributes {
        distance_m,
        elevation_gain_m: 0.0,
        elevation_loss_m: 0.0,
        surface: Surface::Paved,
        highway: HighwayType::Path,
        technical_grade: TechnicalGrade::Hiking,
        access: AccessRestriction::OPEN,
    }
}

#[test]
fn passable_costs_never_undercut_distance() {
    for mode in [TravelMode::Hiking, TravelMode::Cycling] {
        for surface in SURFACES {
            for highway in HIGHWAYS {
                for technical_grade in GRADES {
                    for (gain, loss) in [(0.0, 0.0), (80.0, 0.0), (0.0, 30.0), (0.0, 400.0)] {
                        let attributes = SegmentAttributes {
                            surface,
                            highway,
                            technical_grade,
                            elevation_gain_m: gain,
                            elevation_loss_m: loss,
                            ..segment(750.0)
                        };
                        let cost = edge_cost(&attributes, mode);
                        assert!(
                            cost.is_infinite() || cost >= 750.0,
                            "{mode} {surface} {highway} {technical_grade}: {cost}"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn steep_descent_costs_more_than_the_same_climb() {
    for mode in [TravelMode::Hiking, TravelMode::Cycling] {
        let climb = SegmentAttributes {
            elevation_gain_m: 200.0,
            ..segment(500.0)
        };
        let descent = SegmentAttributes {
            elevation_loss_m: 200.0,
            ..segment(500.0)
        };
        assert!(edge_cost(&descent, mode) > edge_cost(&climb, mode), "{mode}");
    }
}

#[test]
fn gentle_descent_is_free() {
    let descent = SegmentAttributes {
        elevation_loss_m: 20.0,
        ..segment(1000.0)
    };
    assert_relative_eq!(edge_cost(&descent, TravelMode::Hiking), 1000.0);
}

#[test]
fn access_restrictions_are_per_mode() {
    let no_bikes = SegmentAttributes {
        access: AccessRestriction::from_tags(None, None, Some("no")),
        ..segment(100.0)
    };
    assert!(edge_cost(&no_bikes, TravelMode::Hiking).is_finite());
    assert!(edge_cost(&no_bikes, TravelMode::Cycling).is_infinite());

    let private = SegmentAttributes {
        access: AccessRestriction::from_tags(Some("private"), None, None),
        ..segment(100.0)
    };
    assert!(edge_cost(&private, TravelMode::Hiking).is_infinite());
}

#[test]
fn duration_uses_the_mode_base_speed() {
    assert_relative_eq!(estimated_duration_s(5000.0, TravelMode::Hiking), 3600.0);
    assert_relative_eq!(estimated_duration_s(15000.0, TravelMode::Cycling), 3600.0);
    assert_eq!(
        CostProfile::for_mode(TravelMode::Cycling),
        &CostProfile::CYCLING
    );
}
