//! End-to-end placement scenarios.

use town_core::audit::{CollisionAuditor, CollisionKind, Severity};
use town_core::config::{LayoutConfig, MarginConfig};
use town_core::connectivity::{check_connectivity, check_segments};
use town_core::error::LayoutError;
use town_core::generators::ScatterPlan;
use town_core::placement::{is_placement_safe, road_obstacles, Category, ObjectKind};
use town_core::resolver::PlacementResolver;
use town_core::roads::{RoadLayout, RoadNetwork, RoadPlan, RoadClass};
use town_core::town::build_town;
use town_test_utils::fixtures::{
    bare_config, building, fixed, point, road_row, rock, straight_road, tree,
};

#[test]
fn test_straight_road_with_outlier_has_two_components() {
    let mut segments = road_row(-8, 0, 5, 4);
    segments.extend(road_row(100, 100, 1, 4));

    let report = check_segments(&segments, fixed(4));

    assert_eq!(report.component_count(), 2);
    assert_eq!(report.component_sizes(), vec![5, 1]);
    assert!(!report.fully_connected);
}

#[test]
fn test_trivial_networks() {
    let empty = check_connectivity(&RoadNetwork::from_segments(fixed(4), Vec::new()));
    assert_eq!(empty.component_count(), 0);
    assert!(empty.fully_connected);
    assert!(empty.is_empty());

    let single = check_connectivity(&straight_road(1));
    assert_eq!(single.component_count(), 1);
    assert!(single.fully_connected);
}

#[test]
fn test_coincident_trees_are_separated() {
    let rules = bare_config().validate().unwrap();
    let resolver = PlacementResolver::new(&rules);
    let mut trees = vec![tree(0, 0.0, 0.0, 1.5), tree(1, 0.0, 0.0, 1.5)];

    let empty = RoadNetwork::from_segments(fixed(4), Vec::new());
    let report = resolver.resolve(&empty, &mut trees).unwrap();

    let gap = trees[0].center().distance(trees[1].center());
    assert!(gap >= fixed(3), "gap {gap}");
    assert!(report.max_steps() <= 30);
    assert_eq!(report.exhausted_count(), 0);
}

#[test]
fn test_distant_building_is_untouched() {
    let rules = LayoutConfig::roads_only().validate().unwrap();
    let network = straight_road(5);
    let mut objects = vec![building(0, 0.0, 40.0, 3.0, 3.0)];
    let before = objects[0];

    let report = PlacementResolver::new(&rules).resolve(&network, &mut objects).unwrap();

    assert_eq!(objects[0], before);
    let entry = report.entry_for(0).unwrap();
    assert_eq!(entry.steps, 0);
    assert_eq!(entry.final_position, entry.original);
    assert!(!entry.adjusted());
}

#[test]
fn test_single_tree_road_overlap_is_one_high_record() {
    let rules = LayoutConfig::roads_only().validate().unwrap();
    let network = straight_road(1);
    let objects = [tree(0, 0.5, 0.5, 1.0)];

    let audit = CollisionAuditor::new(&rules)
        .detect_all_collisions(&network, &objects)
        .unwrap();

    assert_eq!(audit.records.len(), 1);
    assert_eq!(audit.records[0].kind, CollisionKind::TreeRoad);
    assert_eq!(audit.records[0].severity, Severity::High);
    for kind in CollisionKind::ALL {
        if kind != CollisionKind::TreeRoad {
            assert_eq!(audit.count_of(kind), 0, "{kind}");
        }
    }
    assert_eq!(audit.by_severity(Severity::High).count(), 1);
    assert_eq!(audit.by_severity(Severity::Low).count(), 0);
}

#[test]
fn test_resolution_then_audit_is_clean_for_easy_scene() {
    let rules = LayoutConfig::roads_only().validate().unwrap();
    let network = straight_road(9);
    let mut objects = vec![
        building(0, 0.0, 6.0, 3.0, 3.0),
        tree(1, 10.0, 1.0, 1.0),
        tree(2, -10.0, -1.0, 1.0),
        rock(3, 14.0, -1.5, 1.0),
    ];

    let report = PlacementResolver::new(&rules).resolve(&network, &mut objects).unwrap();
    assert_eq!(report.exhausted_count(), 0);
    // Rocks are moved off the road but are not part of the audit.
    assert!(report.entry_for(3).unwrap().adjusted());

    let audit = CollisionAuditor::new(&rules)
        .detect_all_collisions(&network, &objects)
        .unwrap();
    assert!(audit.is_clean(), "{}", audit.summary());

    let obstacles = road_obstacles(&network);
    for object in &objects {
        assert!(is_placement_safe(
            &object.footprint,
            object.category(),
            &obstacles,
            &rules.margins
        ));
    }
}

#[test]
fn test_default_town_is_connected_and_reported() {
    let town = build_town(&LayoutConfig::default()).unwrap();

    assert!(town.connectivity.fully_connected);
    assert!(!town.roads.intersections.is_empty());
    assert_eq!(town.resolution.total_objects(), town.objects.len());
    assert_eq!(town.recheck().unwrap(), town.audit);

    let by_kind = town.resolution.by_kind();
    let counted: usize = by_kind.values().map(|s| s.objects).sum();
    assert_eq!(counted, town.objects.len());
}

#[test]
fn test_fragmented_roads_do_not_fail_the_build() {
    let config = LayoutConfig {
        roads: RoadLayout {
            plans: vec![
                RoadPlan::horizontal("East Road", RoadClass::Arterial, 0.0, 0.0, 16.0),
                RoadPlan::horizontal("Far Road", RoadClass::Residential, 64.0, 0.0, 16.0),
            ],
        },
        ..LayoutConfig::roads_only()
    };

    let town = build_town(&config).unwrap();
    assert_eq!(town.connectivity.component_count(), 2);
    assert!(!town.connectivity.fully_connected);
}

#[test]
fn test_misaligned_road_fails_before_placement() {
    let config = LayoutConfig {
        roads: RoadLayout {
            plans: vec![RoadPlan::horizontal("Crooked", RoadClass::Residential, 2.0, 0.0, 16.0)],
        },
        ..LayoutConfig::default()
    };
    assert!(matches!(build_town(&config), Err(LayoutError::Config(_))));
}

#[test]
fn test_margins_are_shared_by_resolver_and_auditor() {
    // A tree placed just inside the tree margin of a road tile: the resolver
    // moves it and the auditor agrees the final position is clear.
    let config = LayoutConfig::roads_only().with_margins(MarginConfig {
        tree: 2.0,
        ..MarginConfig::default()
    });
    let rules = config.validate().unwrap();
    let network = straight_road(3);
    let mut objects = vec![tree(0, 0.0, 4.5, 1.0)];

    let report = PlacementResolver::new(&rules).resolve(&network, &mut objects).unwrap();
    assert!(report.entries[0].adjusted());

    let audit = CollisionAuditor::new(&rules)
        .detect_all_collisions(&network, &objects)
        .unwrap();
    assert!(audit.is_clean());
    assert_eq!(rules.margins.pair(Category::Tree, Category::Road), fixed(2));
    assert!(objects[0].center().y >= point(0.0, 5.0).y);
}

#[test]
fn test_far_apart_scatters_build_without_overflow() {
    let config = LayoutConfig {
        scatters: vec![
            ScatterPlan::new("West Grove", ObjectKind::Tree, (-30_000.0, 0.0), 40.0, 4),
            ScatterPlan::new("East Grove", ObjectKind::Tree, (30_000.0, 0.0), 40.0, 4),
        ],
        ..LayoutConfig::roads_only()
    };
    config.validate().unwrap();

    let town = build_town(&config).unwrap();
    assert_eq!(town.objects.len(), 8);
    assert_eq!(town.audit.count_of(CollisionKind::TreeRoad), 0);
    // Rendering the report buckets every position into zones.
    assert!(town.resolution.to_string().contains("8 objects"));

    let west = town.objects.iter().filter(|o| o.center().x < fixed(0)).count();
    assert_eq!(west, 4);
}
