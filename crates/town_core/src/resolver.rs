//! Iterative placement resolver.
//!
//! A bounded greedy heuristic: objects are taken in priority order and
//! each one is pushed, a fixed step at a time, straight away from the
//! nearest obstacle it overlaps until it is clear or its retry budget
//! runs out. Running out is a soft failure recorded in the report; the
//! object stays at its last position.
//!
//! Ordering matters: every resolved object becomes an obstacle for the
//! ones after it, so this must stay sequential.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{LayoutRules, Margins};
use crate::error::{LayoutError, Result};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::placement::{nearest_conflict, road_obstacles, ObjectKind, Obstacle, ObstacleSource, PlaceableObject};
use crate::roads::RoadNetwork;

/// One displacement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nudge {
    /// Index of the targeted obstacle in the obstacle slice.
    pub obstacle: usize,
    /// Where the targeted obstacle came from.
    pub source: ObstacleSource,
    /// Unit push direction.
    pub direction: Vec2Fixed,
    /// Center before the step.
    pub from: Vec2Fixed,
    /// Center after the step.
    pub to: Vec2Fixed,
}

/// What happened to one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionEntry {
    /// Object id.
    pub id: u32,
    /// Object kind.
    pub kind: ObjectKind,
    /// Object priority.
    pub priority: i32,
    /// Center before resolution.
    pub original: Vec2Fixed,
    /// Center after resolution.
    pub final_position: Vec2Fixed,
    /// Nudges applied.
    pub steps: u32,
    /// Sum of step lengths.
    #[serde(with = "fixed_serde")]
    pub distance_travelled: Fixed,
    /// Straight-line distance from original to final center.
    #[serde(with = "fixed_serde")]
    pub net_displacement: Fixed,
    /// False when the retry budget ran out with an overlap remaining.
    pub converged: bool,
}

impl ResolutionEntry {
    /// True when the object moved at all.
    #[must_use]
    pub const fn adjusted(&self) -> bool {
        self.steps > 0
    }

    /// True when the object needs manual review.
    #[must_use]
    pub const fn exhausted(&self) -> bool {
        !self.converged
    }
}

/// Coarse grid bucket of final positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId {
    /// Bucket column.
    pub x: i32,
    /// Bucket row.
    pub z: i32,
}

impl ZoneId {
    /// Bucket containing a point.
    #[must_use]
    pub fn containing(point: Vec2Fixed, zone_size: Fixed) -> Self {
        Self {
            x: (point.x / zone_size).floor().to_num::<i32>(),
            z: (point.y / zone_size).floor().to_num::<i32>(),
        }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Aggregates for one object kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KindStats {
    /// Objects of this kind.
    pub objects: usize,
    /// Objects that moved.
    pub adjusted: usize,
    /// Objects that ran out of attempts.
    pub exhausted: usize,
    /// Mean steps over adjusted objects.
    #[serde(with = "fixed_serde")]
    pub average_steps: Fixed,
    /// Mean travelled distance over adjusted objects.
    #[serde(with = "fixed_serde")]
    pub average_distance: Fixed,
}

/// Aggregates for one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneStats {
    /// Objects ending in the zone.
    pub objects: usize,
    /// Of those, how many moved.
    pub adjusted: usize,
    /// Steps spent on objects ending in the zone.
    pub total_steps: u64,
}

/// Outcome of resolving one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Entries in processing order.
    pub entries: Vec<ResolutionEntry>,
    /// Retry budget used for the batch.
    pub max_attempts: u32,
    /// Zone edge length.
    #[serde(with = "fixed_serde")]
    pub zone_size: Fixed,
}

impl ResolutionReport {
    /// Objects in the batch.
    #[must_use]
    pub fn total_objects(&self) -> usize {
        self.entries.len()
    }

    /// Objects that needed any displacement.
    #[must_use]
    pub fn adjusted_count(&self) -> usize {
        self.entries.iter().filter(|e| e.adjusted()).count()
    }

    /// Objects left overlapping after the full budget.
    #[must_use]
    pub fn exhausted_count(&self) -> usize {
        self.entries.iter().filter(|e| e.exhausted()).count()
    }

    /// Steps across the batch.
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.steps)).sum()
    }

    /// Most steps spent on one object.
    #[must_use]
    pub fn max_steps(&self) -> u32 {
        self.entries.iter().map(|e| e.steps).max().unwrap_or(0)
    }

    /// Entry for an object id.
    #[must_use]
    pub fn entry_for(&self, id: u32) -> Option<&ResolutionEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Objects that need manual review.
    pub fn exhausted(&self) -> impl Iterator<Item = &ResolutionEntry> {
        self.entries.iter().filter(|e| e.exhausted())
    }

    /// Per-kind breakdown.
    #[must_use]
    pub fn by_kind(&self) -> BTreeMap<ObjectKind, KindStats> {
        let mut steps: BTreeMap<ObjectKind, (u64, Fixed)> = BTreeMap::new();
        let mut stats: BTreeMap<ObjectKind, KindStats> = BTreeMap::new();

        for entry in &self.entries {
            let kind = stats.entry(entry.kind).or_default();
            kind.objects += 1;
            if entry.adjusted() {
                kind.adjusted += 1;
                let totals = steps.entry(entry.kind).or_insert((0, Fixed::ZERO));
                totals.0 += u64::from(entry.steps);
                totals.1 += entry.distance_travelled;
            }
            if entry.exhausted() {
                kind.exhausted += 1;
            }
        }

        for (kind, (total_steps, total_distance)) in steps {
            if let Some(s) = stats.get_mut(&kind) {
                let n = Fixed::from_num(s.adjusted);
                s.average_steps = Fixed::from_num(total_steps) / n;
                s.average_distance = total_distance / n;
            }
        }
        stats
    }

    /// Per-zone breakdown of final positions.
    #[must_use]
    pub fn by_zone(&self) -> BTreeMap<ZoneId, ZoneStats> {
        let mut zones: BTreeMap<ZoneId, ZoneStats> = BTreeMap::new();
        for entry in &self.entries {
            let zone = zones
                .entry(ZoneId::containing(entry.final_position, self.zone_size))
                .or_default();
            zone.objects += 1;
            zone.total_steps += u64::from(entry.steps);
            if entry.adjusted() {
                zone.adjusted += 1;
            }
        }
        zones
    }

    /// Zones with at least two adjusted objects and more than twice the
    /// mean adjusted count of occupied zones.
    #[must_use]
    pub fn hotspots(&self) -> Vec<(ZoneId, ZoneStats)> {
        let zones = self.by_zone();
        if zones.is_empty() {
            return Vec::new();
        }
        let total_adjusted: usize = zones.values().map(|z| z.adjusted).sum();
        let occupied = zones.len();
        zones
            .into_iter()
            .filter(|(_, z)| z.adjusted >= 2 && z.adjusted * occupied > 2 * total_adjusted)
            .collect()
    }
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Placement resolution: {} objects, {} adjusted, {} exhausted (budget {})",
            self.total_objects(),
            self.adjusted_count(),
            self.exhausted_count(),
            self.max_attempts
        )?;
        writeln!(
            f,
            "  steps: total {}, max {}",
            self.total_steps(),
            self.max_steps()
        )?;
        for (kind, stats) in self.by_kind() {
            writeln!(
                f,
                "  {:<10} {:>4} objects, {:>3} adjusted, avg {:.1} steps, avg {:.2} units",
                kind.name(),
                stats.objects,
                stats.adjusted,
                stats.average_steps.to_num::<f64>(),
                stats.average_distance.to_num::<f64>()
            )?;
        }
        for (zone, stats) in self.hotspots() {
            writeln!(
                f,
                "  hotspot zone {zone}: {} of {} objects adjusted",
                stats.adjusted, stats.objects
            )?;
        }
        for entry in self.exhausted() {
            writeln!(
                f,
                "  review {} #{}: {} -> {} after {} steps",
                entry.kind, entry.id, entry.original, entry.final_position, entry.steps
            )?;
        }
        Ok(())
    }
}

/// Pushes overlapping objects apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementResolver {
    margins: Margins,
    step_length: Fixed,
    max_attempts: u32,
    zone_size: Fixed,
}

impl PlacementResolver {
    /// Resolver using the validated rules.
    #[must_use]
    pub const fn new(rules: &LayoutRules) -> Self {
        Self {
            margins: rules.margins,
            step_length: rules.step_length,
            max_attempts: rules.max_attempts,
            zone_size: rules.zone_size,
        }
    }

    /// Step length.
    #[must_use]
    pub const fn step_length(&self) -> Fixed {
        self.step_length
    }

    /// Retry budget.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The next step for an object, or `None` when it overlaps nothing.
    ///
    /// The push goes from the nearest overlapping obstacle's center to
    /// the object's center; coincident centers push along +X.
    #[must_use]
    pub fn nudge(&self, object: &PlaceableObject, obstacles: &[Obstacle]) -> Option<Nudge> {
        let (index, _) =
            nearest_conflict(&object.footprint, object.category(), obstacles, &self.margins)?;
        let from = object.center();
        let away = from - obstacles[index].footprint.center();
        let mut direction = away.normalize();
        if direction == Vec2Fixed::ZERO {
            direction = Vec2Fixed::UNIT_X;
        }
        Some(Nudge {
            obstacle: index,
            source: obstacles[index].source,
            direction,
            from,
            to: from + direction.scale(self.step_length),
        })
    }

    /// Resolve one object against a fixed obstacle set.
    pub fn resolve_one(&self, object: &mut PlaceableObject, obstacles: &[Obstacle]) -> ResolutionEntry {
        let original = object.center();
        let mut steps = 0u32;
        let mut converged = true;

        while let Some(nudge) = self.nudge(object, obstacles) {
            if steps == self.max_attempts {
                converged = false;
                break;
            }
            object.set_center(nudge.to);
            steps += 1;
        }

        let final_position = object.center();
        ResolutionEntry {
            id: object.id,
            kind: object.kind,
            priority: object.priority,
            original,
            final_position,
            steps,
            distance_travelled: self.step_length * Fixed::from_num(steps),
            net_displacement: original.distance(final_position),
            converged,
        }
    }

    /// Resolve a batch against the road tiles of a network.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidFootprint`] before moving anything if
    /// any object has a non-positive size.
    pub fn resolve(&self, network: &RoadNetwork, objects: &mut [PlaceableObject]) -> Result<ResolutionReport> {
        self.resolve_against(road_obstacles(network), objects)
    }

    /// Resolve a batch against an arbitrary static obstacle set.
    ///
    /// Objects are processed by descending priority (ties keep input
    /// order); each resolved object joins the obstacle set.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidFootprint`] before moving anything if
    /// any object has a non-positive size.
    pub fn resolve_against(
        &self,
        mut obstacles: Vec<Obstacle>,
        objects: &mut [PlaceableObject],
    ) -> Result<ResolutionReport> {
        for object in objects.iter() {
            if let Some(reason) = object.footprint.defect() {
                return Err(LayoutError::InvalidFootprint {
                    id: object.id,
                    reason,
                });
            }
        }

        let mut order: Vec<usize> = (0..objects.len()).collect();
        order.sort_by_key(|&i| Reverse(objects[i].priority));

        obstacles.reserve(objects.len());
        let mut entries = Vec::with_capacity(objects.len());

        for index in order {
            let object = &mut objects[index];
            let entry = self.resolve_one(object, &obstacles);

            if entry.exhausted() {
                tracing::warn!(
                    id = entry.id,
                    kind = %entry.kind,
                    steps = entry.steps,
                    position = %entry.final_position,
                    "Retry budget exhausted; object still overlaps"
                );
            } else if entry.adjusted() {
                tracing::debug!(
                    id = entry.id,
                    kind = %entry.kind,
                    steps = entry.steps,
                    from = %entry.original,
                    to = %entry.final_position,
                    "Nudged object clear"
                );
            }

            obstacles.push(Obstacle::from_object(object));
            entries.push(entry);
        }

        let report = ResolutionReport {
            entries,
            max_attempts: self.max_attempts,
            zone_size: self.zone_size,
        };
        tracing::info!(
            objects = report.total_objects(),
            adjusted = report.adjusted_count(),
            exhausted = report.exhausted_count(),
            max_steps = report.max_steps(),
            "Placement resolution finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutConfig, MarginConfig};
    use crate::footprint::Footprint;
    use crate::placement::{is_placement_safe, Category};
    use crate::roads::{Orientation, RoadSegment};

    fn f(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    fn v(x: f64, y: f64) -> Vec2Fixed {
        Vec2Fixed::new(f(x), f(y))
    }

    fn resolver(margins: MarginConfig) -> PlacementResolver {
        let rules = LayoutConfig::roads_only()
            .with_margins(margins)
            .validate()
            .unwrap();
        PlacementResolver::new(&rules)
    }

    fn tree(id: u32, x: f64, y: f64, radius: f64, priority: i32) -> PlaceableObject {
        PlaceableObject::new(id, ObjectKind::Tree, Footprint::circle(v(x, y), f(radius)), priority)
    }

    fn road_row(xs: &[i32]) -> RoadNetwork {
        RoadNetwork::from_segments(
            f(4.0),
            xs.iter()
                .map(|&x| RoadSegment::new(Vec2Fixed::from_ints(x, 0), Orientation::Horizontal, f(4.0)))
                .collect(),
        )
    }

    #[test]
    fn test_coincident_trees_separate() {
        let resolver = resolver(MarginConfig::zero());
        let mut trees = vec![tree(0, 0.0, 0.0, 1.5, 30), tree(1, 0.0, 0.0, 1.5, 30)];
        let report = resolver.resolve(&road_row(&[]), &mut trees).unwrap();

        let gap = trees[0].center().distance(trees[1].center());
        let tolerance = f(0.0001);
        assert!(gap + tolerance >= f(3.0), "gap {gap}");
        assert!(report.max_steps() <= 30);
        assert_eq!(report.exhausted_count(), 0);

        // The first tree stays, the second goes along +X.
        assert_eq!(trees[0].center(), Vec2Fixed::ZERO);
        assert!(trees[1].center().x > Fixed::ZERO);
        assert_eq!(trees[1].center().y, Fixed::ZERO);
        assert_eq!(report.entry_for(1).map(|e| e.steps), Some(3));
    }

    #[test]
    fn test_far_building_is_untouched() {
        let resolver = resolver(MarginConfig::default());
        let original = Footprint::rect(v(60.0, 60.0), v(3.0, 3.0));
        let mut objects = vec![PlaceableObject::new(9, ObjectKind::Building, original, 100)];
        let report = resolver.resolve(&road_row(&[-4, 0, 4]), &mut objects).unwrap();

        assert_eq!(objects[0].footprint, original);
        let entry = report.entry_for(9).unwrap();
        assert_eq!(entry.steps, 0);
        assert!(entry.converged);
        assert_eq!(entry.net_displacement, Fixed::ZERO);
        assert_eq!(report.adjusted_count(), 0);
    }

    #[test]
    fn test_tree_pushed_off_road() {
        let resolver = resolver(MarginConfig::default());
        let network = road_row(&[-4, 0, 4]);
        let mut objects = vec![tree(0, 0.5, 1.0, 1.0, 30)];
        let report = resolver.resolve(&network, &mut objects).unwrap();

        let entry = report.entries[0];
        assert!(entry.converged);
        assert!(entry.adjusted());
        assert!(is_placement_safe(
            &objects[0].footprint,
            Category::Tree,
            &road_obstacles(&network),
            &MarginConfig::default().to_fixed()
        ));
        assert_eq!(entry.distance_travelled, resolver.step_length() * f(f64::from(entry.steps)));
    }

    #[test]
    fn test_higher_priority_is_never_pushed() {
        let resolver = resolver(MarginConfig::zero());
        let mut objects = vec![
            tree(0, 0.0, 0.0, 1.0, 10),
            PlaceableObject::new(1, ObjectKind::Building, Footprint::rect(v(0.5, 0.0), v(2.0, 2.0)), 100),
        ];
        let report = resolver.resolve(&road_row(&[]), &mut objects).unwrap();

        // Building processed first and left where it was.
        assert_eq!(report.entries[0].id, 1);
        assert_eq!(objects[1].center(), v(0.5, 0.0));
        assert!(objects[0].center().x < Fixed::ZERO);
    }

    #[test]
    fn test_exhaustion_is_soft() {
        // A tiny budget cannot clear a wide building.
        let rules = LayoutConfig::roads_only()
            .with_margins(MarginConfig::zero())
            .with_resolver(0.1, 3)
            .validate()
            .unwrap();
        let resolver = PlacementResolver::new(&rules);
        let mut objects = vec![
            PlaceableObject::new(0, ObjectKind::Building, Footprint::rect(v(0.0, 0.0), v(5.0, 5.0)), 100),
            tree(1, 1.0, 0.0, 1.0, 30),
        ];
        let report = resolver.resolve(&road_row(&[]), &mut objects).unwrap();

        let entry = report.entry_for(1).unwrap();
        assert!(entry.exhausted());
        assert_eq!(entry.steps, 3);
        assert_eq!(report.exhausted_count(), 1);
        assert!(report.to_string().contains("review tree #1"));
    }

    #[test]
    fn test_invalid_footprint_rejected_before_moving() {
        let resolver = resolver(MarginConfig::zero());
        let mut objects = vec![tree(0, 0.0, 0.0, 1.0, 30), tree(1, 0.0, 0.0, 0.0, 30)];
        let err = resolver.resolve(&road_row(&[]), &mut objects).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidFootprint { id: 1, .. }));
        assert_eq!(objects[0].center(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_nudge_targets_nearest_and_moves_away() {
        let resolver = resolver(MarginConfig::zero());
        let network = road_row(&[0, 4]);
        let obstacles = road_obstacles(&network);
        let object = tree(0, 3.0, 1.0, 1.0, 30);
        let nudge = resolver.nudge(&object, &obstacles).unwrap();

        assert_eq!(nudge.source, ObstacleSource::Road(1));
        let target = obstacles[nudge.obstacle].footprint.center();
        assert!(nudge.to.distance_squared(target) > nudge.from.distance_squared(target));
    }

    #[test]
    fn test_report_breakdowns() {
        let resolver = resolver(MarginConfig::zero());
        let mut objects = vec![
            tree(0, 0.0, 0.0, 1.5, 30),
            tree(1, 0.0, 0.0, 1.5, 30),
            tree(2, 0.0, 0.0, 1.5, 30),
            PlaceableObject::new(3, ObjectKind::Rock, Footprint::circle(v(200.0, 200.0), f(1.0)), 40),
        ];
        let report = resolver.resolve(&road_row(&[]), &mut objects).unwrap();

        let kinds = report.by_kind();
        assert_eq!(kinds[&ObjectKind::Tree].objects, 3);
        assert_eq!(kinds[&ObjectKind::Tree].adjusted, 2);
        assert!(kinds[&ObjectKind::Tree].average_steps > Fixed::ZERO);
        assert_eq!(kinds[&ObjectKind::Rock].adjusted, 0);
        assert_eq!(kinds[&ObjectKind::Rock].average_steps, Fixed::ZERO);

        let zones = report.by_zone();
        let rock_zone = ZoneId::containing(v(200.0, 200.0), f(32.0));
        assert_eq!(zones[&rock_zone].objects, 1);
        assert_eq!(zones.values().map(|z| z.objects).sum::<usize>(), 4);
        assert_eq!(report.total_objects(), 4);
    }

    #[test]
    fn test_hotspot_detection() {
        let resolver = resolver(MarginConfig::zero());
        let mut objects: Vec<_> = (0..4).map(|i| tree(i, 1.0, 1.0, 1.0, 30)).collect();
        for (i, x) in [100.0, 200.0, 300.0, 400.0].iter().enumerate() {
            objects.push(tree(10 + i as u32, *x, 100.0, 1.0, 30));
        }
        let report = resolver.resolve(&road_row(&[]), &mut objects).unwrap();

        let hotspots = report.hotspots();
        assert_eq!(hotspots.len(), 1);
        assert!(hotspots[0].1.adjusted >= 2);
    }

    #[test]
    fn test_zone_of_negative_coordinates() {
        assert_eq!(ZoneId::containing(v(-0.5, 31.9), f(32.0)), ZoneId { x: -1, z: 0 });
    }
}
