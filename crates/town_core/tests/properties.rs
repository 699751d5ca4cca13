//! Property-based tests for the predicate, the resolver and connectivity.

use proptest::prelude::*;
use town_core::config::{LayoutConfig, Margins};
use town_core::connectivity::check_segments;
use town_core::placement::{is_placement_safe, road_obstacles, Category, Obstacle, PlaceableObject};
use town_core::resolver::PlacementResolver;
use town_core::roads::RoadNetwork;
use town_test_utils::determinism::strategies::{
    arb_footprint, arb_margin, arb_object, arb_object_list, arb_tile_set,
};
use town_test_utils::fixtures::{fixed, straight_road};

fn default_margins() -> Margins {
    LayoutConfig::default().margins.to_fixed()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_overlap_is_symmetric(a in arb_footprint(), b in arb_footprint(), margin in arb_margin()) {
        prop_assert_eq!(a.overlaps(&b, margin), b.overlaps(&a, margin));
    }

    #[test]
    fn prop_overlap_is_deterministic(a in arb_footprint(), b in arb_footprint(), margin in arb_margin()) {
        prop_assert_eq!(a.overlaps(&b, margin), a.overlaps(&b, margin));
    }

    #[test]
    fn prop_larger_margin_never_clears_an_overlap(
        a in arb_footprint(),
        b in arb_footprint(),
        margin in arb_margin(),
    ) {
        if a.overlaps(&b, margin) {
            prop_assert!(a.overlaps(&b, margin + fixed(1)));
        }
    }

    #[test]
    fn prop_resolver_converges_or_flags_exhaustion(mut objects in arb_object_list(12)) {
        let rules = LayoutConfig::roads_only().validate().unwrap();
        let resolver = PlacementResolver::new(&rules);
        let network = straight_road(9);

        let report = resolver.resolve(&network, &mut objects).unwrap();

        // Replay the processing order: each object was checked against the
        // roads plus every object resolved before it.
        let mut obstacles = road_obstacles(&network);
        for entry in &report.entries {
            let object: &PlaceableObject = objects.iter().find(|o| o.id == entry.id).unwrap();
            prop_assert_eq!(object.center(), entry.final_position);
            let safe = is_placement_safe(&object.footprint, object.category(), &obstacles, &rules.margins);
            if entry.converged {
                prop_assert!(safe, "object {} reported converged but overlaps", entry.id);
                prop_assert!(entry.steps <= rules.max_attempts);
            } else {
                prop_assert!(!safe);
                prop_assert_eq!(entry.steps, rules.max_attempts);
            }
            obstacles.push(Obstacle::from_object(object));
        }
    }

    #[test]
    fn prop_priorities_are_processed_in_order(mut objects in arb_object_list(12)) {
        let rules = LayoutConfig::roads_only().validate().unwrap();
        let empty = RoadNetwork::from_segments(fixed(4), Vec::new());
        let report = PlacementResolver::new(&rules).resolve(&empty, &mut objects).unwrap();

        prop_assert!(report.entries.windows(2).all(|w| w[0].priority >= w[1].priority));
    }

    #[test]
    fn prop_nudge_moves_away_from_target(object in arb_object(0), others in arb_object_list(6)) {
        let rules = LayoutConfig::roads_only().validate().unwrap();
        let resolver = PlacementResolver::new(&rules);
        let mut obstacles = road_obstacles(&straight_road(5));
        obstacles.extend(others.iter().map(Obstacle::from_object));

        if let Some(nudge) = resolver.nudge(&object, &obstacles) {
            let target = obstacles[nudge.obstacle].footprint.center();
            prop_assert!(nudge.to.distance_squared(target) >= nudge.from.distance_squared(target));
            prop_assert!(!is_placement_safe(
                &object.footprint,
                object.category(),
                &obstacles,
                &default_margins(),
            ));
        } else {
            prop_assert!(is_placement_safe(
                &object.footprint,
                object.category(),
                &obstacles,
                &default_margins(),
            ));
        }
    }

    #[test]
    fn prop_connectivity_partitions_every_tile(tiles in arb_tile_set(48)) {
        let report = check_segments(&tiles, fixed(4));
        let mut members: Vec<usize> = report.components.iter().flatten().copied().collect();
        members.sort_unstable();
        prop_assert_eq!(members, (0..tiles.len()).collect::<Vec<_>>());
        prop_assert_eq!(report.fully_connected, report.component_count() <= 1);
        prop_assert_eq!(report, check_segments(&tiles, fixed(4)));
    }
}

#[test]
fn test_road_margin_table_matches_categories() {
    let margins = default_margins();
    assert_eq!(margins.pair(Category::Building, Category::Road), fixed(6));
    assert_eq!(margins.pair(Category::Tree, Category::Road), fixed(3));
    assert_eq!(margins.pair(Category::Tree, Category::Building), fixed(6));
}
