//! Placeable objects and the placement safety predicate.
//!
//! The predicate answers one question: does a candidate footprint
//! clear every protected zone (road tiles and objects already placed)
//! once the category margins are applied? It never mutates anything.

use serde::{Deserialize, Serialize};

use crate::config::Margins;
use crate::footprint::Footprint;
use crate::math::{Fixed, Vec2Fixed};
use crate::roads::RoadNetwork;

/// Kind of a placeable object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum ObjectKind {
    /// Boulder or rock cluster (circle footprint).
    Rock,
    /// Tree (circle footprint).
    #[default]
    Tree,
    /// Building (box footprint).
    Building,
    /// Parked vehicle (box footprint).
    Vehicle,
    /// Bench, lamp, planter and similar props (box footprint).
    Decoration,
}

impl ObjectKind {
    /// Every kind, in report order.
    pub const ALL: [Self; 5] = [
        Self::Building,
        Self::Vehicle,
        Self::Rock,
        Self::Tree,
        Self::Decoration,
    ];

    /// Margin category of this kind.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Rock => Category::Rock,
            Self::Tree => Category::Tree,
            Self::Building => Category::Building,
            Self::Vehicle => Category::Vehicle,
            Self::Decoration => Category::Decoration,
        }
    }

    /// Lowercase name used in logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Tree => "tree",
            Self::Building => "building",
            Self::Vehicle => "vehicle",
            Self::Decoration => "decoration",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Category of static geometry, the key of the margin table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Category {
    /// Road tile.
    #[default]
    Road,
    /// Building.
    Building,
    /// Tree.
    Tree,
    /// Rock.
    Rock,
    /// Vehicle.
    Vehicle,
    /// Decoration.
    Decoration,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Road => "road",
            Self::Building => "building",
            Self::Tree => "tree",
            Self::Rock => "rock",
            Self::Vehicle => "vehicle",
            Self::Decoration => "decoration",
        };
        f.write_str(name)
    }
}

/// An object whose position the resolver may adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceableObject {
    /// Stable identifier, unique within one build.
    pub id: u32,
    /// What the object is.
    pub kind: ObjectKind,
    /// Plan-view footprint (position plus size).
    pub footprint: Footprint,
    /// Higher priorities are resolved first and never pushed by lower ones.
    pub priority: i32,
}

impl PlaceableObject {
    /// Create a new placeable object.
    #[must_use]
    pub const fn new(id: u32, kind: ObjectKind, footprint: Footprint, priority: i32) -> Self {
        Self {
            id,
            kind,
            footprint,
            priority,
        }
    }

    /// Current center.
    #[must_use]
    pub const fn center(&self) -> Vec2Fixed {
        self.footprint.center()
    }

    /// Move the object, keeping its shape.
    pub fn set_center(&mut self, center: Vec2Fixed) {
        self.footprint = self.footprint.with_center(center);
    }

    /// Margin category.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.kind.category()
    }
}

/// Where an obstacle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleSource {
    /// Road tile by index in the network.
    Road(usize),
    /// Placed object by id.
    Object(u32),
}

/// A protected zone that candidates must not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Margin category.
    pub category: Category,
    /// Plan-view footprint.
    pub footprint: Footprint,
    /// Origin of the obstacle.
    pub source: ObstacleSource,
}

impl Obstacle {
    /// Obstacle for an already placed object.
    #[must_use]
    pub const fn from_object(object: &PlaceableObject) -> Self {
        Self {
            category: object.kind.category(),
            footprint: object.footprint,
            source: ObstacleSource::Object(object.id),
        }
    }
}

/// Every road tile as an obstacle, in network order.
#[must_use]
pub fn road_obstacles(network: &RoadNetwork) -> Vec<Obstacle> {
    network
        .segments
        .iter()
        .enumerate()
        .map(|(index, segment)| Obstacle {
            category: Category::Road,
            footprint: segment.footprint(),
            source: ObstacleSource::Road(index),
        })
        .collect()
}

/// Whether two categorized footprints overlap under the pair margin.
#[must_use]
pub fn footprints_conflict(
    a: &Footprint,
    a_category: Category,
    b: &Footprint,
    b_category: Category,
    margins: &Margins,
) -> bool {
    a.overlaps(b, margins.pair(a_category, b_category))
}

/// Indices of every obstacle the candidate overlaps, in obstacle order.
pub fn conflicts<'a>(
    candidate: &'a Footprint,
    category: Category,
    obstacles: &'a [Obstacle],
    margins: &'a Margins,
) -> impl Iterator<Item = usize> + 'a {
    obstacles.iter().enumerate().filter_map(move |(i, o)| {
        footprints_conflict(candidate, category, &o.footprint, o.category, margins).then_some(i)
    })
}

/// Index of the first obstacle the candidate overlaps, if any.
#[must_use]
pub fn first_conflict(
    candidate: &Footprint,
    category: Category,
    obstacles: &[Obstacle],
    margins: &Margins,
) -> Option<usize> {
    conflicts(candidate, category, obstacles, margins).next()
}

/// True when the candidate clears every obstacle.
#[must_use]
pub fn is_placement_safe(
    candidate: &Footprint,
    category: Category,
    obstacles: &[Obstacle],
    margins: &Margins,
) -> bool {
    first_conflict(candidate, category, obstacles, margins).is_none()
}

/// Nearest overlapping obstacle by center distance.
///
/// Ties go to the obstacle listed first.
#[must_use]
pub fn nearest_conflict(
    candidate: &Footprint,
    category: Category,
    obstacles: &[Obstacle],
    margins: &Margins,
) -> Option<(usize, Fixed)> {
    let center = candidate.center();
    let mut best: Option<(usize, Fixed)> = None;
    for index in conflicts(candidate, category, obstacles, margins) {
        let dist_sq = center.distance_squared(obstacles[index].footprint.center());
        if best.map_or(true, |(_, d)| dist_sq < d) {
            best = Some((index, dist_sq));
        }
    }
    best
}
