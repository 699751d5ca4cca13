//! End-to-end town build.
//!
//! A build runs, in order: configuration validation, road tiling, the
//! connectivity check, object generation, iterative resolution and the
//! collision audit. Everything is keyed off the configuration seed, so
//! a build is reproducible bit for bit.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::audit::{CollisionAudit, CollisionAuditor};
use crate::config::{LayoutConfig, Margins, SeverityTable};
use crate::connectivity::{check_connectivity, ConnectivityReport};
use crate::error::{LayoutError, Result};
use crate::generators::generate_objects;
use crate::placement::PlaceableObject;
use crate::resolver::{PlacementResolver, ResolutionReport};
use crate::rng::LayoutRng;
use crate::roads::{build_road_network, RoadNetwork};

/// Everything one build produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TownLayout {
    /// Seed the build ran with.
    pub seed: u64,
    /// Road tiles and intersections.
    pub roads: RoadNetwork,
    /// Road connectivity findings.
    pub connectivity: ConnectivityReport,
    /// Objects at their final positions, in id order.
    pub objects: Vec<PlaceableObject>,
    /// Per-object resolution outcome.
    pub resolution: ResolutionReport,
    /// Collisions remaining after resolution.
    pub audit: CollisionAudit,
    margins: Margins,
    severities: SeverityTable,
}

impl TownLayout {
    /// Re-run the collision audit against the current object positions.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidFootprint`] if an object was given an
    /// invalid size after the build.
    pub fn recheck(&self) -> Result<CollisionAudit> {
        CollisionAuditor::with_tables(self.margins, self.severities)
            .detect_all_collisions(&self.roads, &self.objects)
    }

    /// Deterministic hash of the road tiles and the final object layout.
    #[must_use]
    pub fn layout_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.seed.hash(&mut hasher);
        self.roads.segments.len().hash(&mut hasher);
        for segment in &self.roads.segments {
            segment.hash(&mut hasher);
        }

        let mut objects: Vec<&PlaceableObject> = self.objects.iter().collect();
        objects.sort_by_key(|o| o.id);
        objects.len().hash(&mut hasher);
        for object in objects {
            object.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Encode the layout as a bincode snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Snapshot`] if encoding fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| LayoutError::Snapshot(format!("Failed to serialize layout: {e}")))
    }

    /// Decode a bincode snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Snapshot`] if the bytes are not a layout.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| LayoutError::Snapshot(format!("Failed to deserialize layout: {e}")))
    }
}

/// Build a complete town from a configuration.
///
/// # Errors
///
/// Returns [`LayoutError::Config`] when the configuration is rejected.
/// Fragmented roads, exhausted objects and audited collisions are reported
/// in the returned layout, not as errors.
pub fn build_town(config: &LayoutConfig) -> Result<TownLayout> {
    let rules = config.validate()?;
    let roads = build_road_network(&rules.grid);
    let connectivity = check_connectivity(&roads);

    let mut rng = LayoutRng::new(rules.seed);
    let mut objects = generate_objects(config, &rules, &roads, &mut rng);

    let resolution = PlacementResolver::new(&rules).resolve(&roads, &mut objects)?;
    objects.sort_by_key(|o| o.id);

    let audit = CollisionAuditor::new(&rules).detect_all_collisions(&roads, &objects)?;

    tracing::info!(
        seed = rules.seed,
        tiles = roads.len(),
        intersections = roads.intersections.len(),
        components = connectivity.component_count(),
        objects = objects.len(),
        adjusted = resolution.adjusted_count(),
        exhausted = resolution.exhausted_count(),
        collisions = audit.records.len(),
        "Town built"
    );

    Ok(TownLayout {
        seed: rules.seed,
        roads,
        connectivity,
        objects,
        resolution,
        audit,
        margins: rules.margins,
        severities: rules.severities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::ObjectKind;

    #[test]
    fn test_roads_only_town() {
        let town = build_town(&LayoutConfig::roads_only()).unwrap();
        assert!(town.objects.is_empty());
        assert!(town.connectivity.fully_connected);
        assert!(town.audit.is_clean());
        assert_eq!(town.resolution.total_objects(), 0);
    }

    #[test]
    fn test_default_town_has_every_kind() {
        let town = build_town(&LayoutConfig::default()).unwrap();
        for kind in ObjectKind::ALL {
            assert!(town.objects.iter().any(|o| o.kind == kind), "no {kind}");
        }
        assert_eq!(town.resolution.total_objects(), town.objects.len());
        assert!(town.objects.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn test_recheck_matches_build_audit() {
        let town = build_town(&LayoutConfig::default()).unwrap();
        assert_eq!(town.recheck().unwrap(), town.audit);
    }

    #[test]
    fn test_recheck_sees_moved_object() {
        let mut town = build_town(&LayoutConfig::default()).unwrap();
        let tree = town
            .objects
            .iter_mut()
            .find(|o| o.kind == ObjectKind::Tree)
            .unwrap();
        let road_center = town.roads.segments[0].center;
        tree.set_center(road_center);

        let audit = town.recheck().unwrap();
        assert!(!audit.is_clean());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let town = build_town(&LayoutConfig::default()).unwrap();
        let bytes = town.serialize().unwrap();
        let restored = TownLayout::deserialize(&bytes).unwrap();
        assert_eq!(restored.layout_hash(), town.layout_hash());
        assert_eq!(restored, town);
    }

    #[test]
    fn test_garbage_snapshot_rejected() {
        let err = TownLayout::deserialize(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, LayoutError::Snapshot(_)));
    }

    #[test]
    fn test_invalid_config_is_rejected_before_placement() {
        let config = LayoutConfig {
            piece_size: 0.0,
            ..LayoutConfig::default()
        };
        assert!(matches!(build_town(&config), Err(LayoutError::Config(_))));
    }
}
