//! Seeded generators for buildings, vegetation, props and vehicles.
//!
//! Generators only propose positions; overlap between objects is left to
//! the resolver. The one exception is building lots, which are re-rolled
//! against the safety predicate because a building that starts on a road
//! is rarely recoverable by nudging.

use serde::{Deserialize, Serialize};

use crate::config::{finite, positive, LayoutConfig, LayoutRules};
use crate::error::{LayoutError, Result};
use crate::footprint::Footprint;
use crate::math::{Fixed, Vec2Fixed};
use crate::placement::{is_placement_safe, road_obstacles, Category, ObjectKind, Obstacle, PlaceableObject};
use crate::rng::LayoutRng;
use crate::roads::{Orientation, RoadNetwork};

/// Upper bound on objects per plan.
const MAX_PLAN_OBJECTS: u32 = 10_000;

/// A grid of building lots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictPlan {
    /// District name (logs only).
    pub name: String,
    /// Center of the first lot.
    pub origin: (f32, f32),
    /// Lot rows (along Z).
    pub rows: u32,
    /// Lot columns (along X).
    pub cols: u32,
    /// Distance between lot centers.
    pub lot_spacing: f32,
    /// Smallest building half extent.
    pub min_half_extent: f32,
    /// Largest building half extent.
    pub max_half_extent: f32,
    /// Maximum lot jitter on each axis.
    pub jitter: f32,
}

impl DistrictPlan {
    fn block(name: &str, origin: (f32, f32), rows: u32, cols: u32) -> Self {
        Self {
            name: name.to_string(),
            origin,
            rows,
            cols,
            lot_spacing: 16.0,
            min_half_extent: 2.5,
            max_half_extent: 3.5,
            jitter: 1.0,
        }
    }

    /// Districts filling the blocks of [`crate::roads::RoadLayout::default_town`].
    #[must_use]
    pub fn default_town() -> Vec<Self> {
        vec![
            Self::block("Old Town", (16.0, 16.0), 2, 2),
            Self::block("West End", (-32.0, 16.0), 2, 2),
            Self::block("Northgate", (-32.0, -32.0), 2, 2),
            Self::block("Mill Row", (16.0, 64.0), 1, 2),
        ]
    }

    /// Check sizes and counts.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Config`] naming the district.
    pub fn validate(&self) -> Result<()> {
        let ctx = |field: &str| format!("district '{}' {field}", self.name);
        if self.name.trim().is_empty() {
            return Err(LayoutError::config("district with an empty name"));
        }
        finite(&ctx("origin.x"), self.origin.0)?;
        finite(&ctx("origin.y"), self.origin.1)?;
        positive(&ctx("lot_spacing"), self.lot_spacing)?;
        let min = positive(&ctx("min_half_extent"), self.min_half_extent)?;
        let max = positive(&ctx("max_half_extent"), self.max_half_extent)?;
        if min > max {
            return Err(LayoutError::config(ctx("has min_half_extent above max_half_extent")));
        }
        if finite(&ctx("jitter"), self.jitter)? < Fixed::ZERO {
            return Err(LayoutError::config(ctx("jitter is negative")));
        }
        if self.rows == 0 || self.cols == 0 || self.rows.saturating_mul(self.cols) > MAX_PLAN_OBJECTS {
            return Err(LayoutError::config(ctx("needs between 1 and 10000 lots")));
        }
        Ok(())
    }
}

/// Random scatter of one object kind around a center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPlan {
    /// Scatter name (logs only).
    pub name: String,
    /// Kind of object produced.
    pub kind: ObjectKind,
    /// Center of the scatter square.
    pub center: (f32, f32),
    /// Half size of the scatter square.
    pub spread: f32,
    /// Number of objects.
    pub count: u32,
    /// Smallest radius (circles) or half extent (boxes).
    pub min_size: f32,
    /// Largest radius or half extent.
    pub max_size: f32,
}

impl ScatterPlan {
    /// Create a scatter plan.
    #[must_use]
    pub fn new(name: &str, kind: ObjectKind, center: (f32, f32), spread: f32, count: u32) -> Self {
        let (min_size, max_size) = match kind {
            ObjectKind::Tree => (0.8, 1.6),
            ObjectKind::Rock => (0.6, 1.4),
            ObjectKind::Decoration => (0.3, 0.6),
            ObjectKind::Vehicle => (1.0, 2.2),
            ObjectKind::Building => (2.5, 3.5),
        };
        Self {
            name: name.to_string(),
            kind,
            center,
            spread,
            count,
            min_size,
            max_size,
        }
    }

    /// Vegetation, rocks and props for the reference town.
    #[must_use]
    pub fn default_town() -> Vec<Self> {
        vec![
            Self::new("Northwest Woods", ObjectKind::Tree, (-76.0, -76.0), 14.0, 18),
            Self::new("Riverside Grove", ObjectKind::Tree, (76.0, 64.0), 10.0, 10),
            Self::new("Quarry", ObjectKind::Rock, (72.0, -72.0), 12.0, 8),
            Self::new("Civic Park", ObjectKind::Tree, (24.0, -24.0), 12.0, 8),
            Self::new("Park Furniture", ObjectKind::Decoration, (24.0, -24.0), 14.0, 6),
        ]
    }

    /// Check sizes and counts.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Config`] naming the scatter.
    pub fn validate(&self) -> Result<()> {
        let ctx = |field: &str| format!("scatter '{}' {field}", self.name);
        if self.name.trim().is_empty() {
            return Err(LayoutError::config("scatter with an empty name"));
        }
        finite(&ctx("center.x"), self.center.0)?;
        finite(&ctx("center.y"), self.center.1)?;
        if finite(&ctx("spread"), self.spread)? < Fixed::ZERO {
            return Err(LayoutError::config(ctx("spread is negative")));
        }
        let min = positive(&ctx("min_size"), self.min_size)?;
        let max = positive(&ctx("max_size"), self.max_size)?;
        if min > max {
            return Err(LayoutError::config(ctx("has min_size above max_size")));
        }
        if self.count > MAX_PLAN_OBJECTS {
            return Err(LayoutError::config(ctx("asks for more than 10000 objects")));
        }
        Ok(())
    }
}

/// Vehicles parked beside random road tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetPlan {
    /// Number of vehicles.
    pub count: u32,
    /// Half length along the road.
    pub half_length: f32,
    /// Half width across the road.
    pub half_width: f32,
    /// Distance from tile center to vehicle center, across the road.
    pub curb_offset: f32,
}

impl Default for FleetPlan {
    fn default() -> Self {
        Self {
            count: 12,
            half_length: 2.2,
            half_width: 1.0,
            curb_offset: 4.0,
        }
    }
}

impl FleetPlan {
    /// Check sizes and counts.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Config`].
    pub fn validate(&self) -> Result<()> {
        positive("fleet half_length", self.half_length)?;
        positive("fleet half_width", self.half_width)?;
        finite("fleet curb_offset", self.curb_offset)?;
        if self.count > MAX_PLAN_OBJECTS {
            return Err(LayoutError::config("fleet asks for more than 10000 vehicles"));
        }
        Ok(())
    }
}

/// Hands out object ids in creation order.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Next unused id.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

fn fx(value: f32) -> Fixed {
    Fixed::checked_from_num(value).unwrap_or(Fixed::ZERO)
}

fn point(p: (f32, f32)) -> Vec2Fixed {
    Vec2Fixed::new(fx(p.0), fx(p.1))
}

/// Place buildings lot by lot, re-rolling lots that are not safe against
/// roads and earlier buildings.
pub fn generate_district(
    plan: &DistrictPlan,
    rules: &LayoutRules,
    obstacles: &mut Vec<Obstacle>,
    rng: &mut LayoutRng,
    ids: &mut IdAllocator,
) -> Vec<PlaceableObject> {
    let origin = point(plan.origin);
    let spacing = fx(plan.lot_spacing);
    let jitter = fx(plan.jitter);
    let (min_half, max_half) = (fx(plan.min_half_extent), fx(plan.max_half_extent));
    let priority = rules.priorities.for_kind(ObjectKind::Building);
    let mut buildings = Vec::new();

    for row in 0..plan.rows {
        for col in 0..plan.cols {
            let lot = origin
                + Vec2Fixed::new(Fixed::from_num(col) * spacing, Fixed::from_num(row) * spacing);

            let mut placed = None;
            for _ in 0..rules.lot_attempts {
                let half = Vec2Fixed::new(
                    rng.range_fixed(min_half, max_half),
                    rng.range_fixed(min_half, max_half),
                );
                let offset = Vec2Fixed::new(
                    rng.range_fixed(-jitter, jitter),
                    rng.range_fixed(-jitter, jitter),
                );
                let candidate = Footprint::rect(lot + offset, half);
                if is_placement_safe(&candidate, Category::Building, obstacles, &rules.margins) {
                    placed = Some(candidate);
                    break;
                }
            }

            match placed {
                Some(footprint) => {
                    let building = PlaceableObject::new(
                        ids.next_id(),
                        ObjectKind::Building,
                        footprint,
                        priority,
                    );
                    obstacles.push(Obstacle::from_object(&building));
                    buildings.push(building);
                }
                None => {
                    tracing::debug!(
                        district = %plan.name,
                        row,
                        col,
                        attempts = rules.lot_attempts,
                        "Skipping lot with no safe building position"
                    );
                }
            }
        }
    }

    buildings
}

/// Scatter objects uniformly in a square around the plan center.
pub fn generate_scatter(
    plan: &ScatterPlan,
    rules: &LayoutRules,
    rng: &mut LayoutRng,
    ids: &mut IdAllocator,
) -> Vec<PlaceableObject> {
    let center = point(plan.center);
    let spread = fx(plan.spread);
    let (min_size, max_size) = (fx(plan.min_size), fx(plan.max_size));
    let priority = rules.priorities.for_kind(plan.kind);

    (0..plan.count)
        .map(|_| {
            let position = center
                + Vec2Fixed::new(
                    rng.range_fixed(-spread, spread),
                    rng.range_fixed(-spread, spread),
                );
            let size = rng.range_fixed(min_size, max_size);
            let footprint = match plan.kind {
                ObjectKind::Tree | ObjectKind::Rock => Footprint::circle(position, size),
                _ => Footprint::rect(position, Vec2Fixed::new(size, size)),
            };
            PlaceableObject::new(ids.next_id(), plan.kind, footprint, priority)
        })
        .collect()
}

/// Park vehicles beside random road tiles, aligned with the road.
pub fn generate_fleet(
    plan: &FleetPlan,
    rules: &LayoutRules,
    network: &RoadNetwork,
    rng: &mut LayoutRng,
    ids: &mut IdAllocator,
) -> Vec<PlaceableObject> {
    let (half_length, half_width) = (fx(plan.half_length), fx(plan.half_width));
    let offset = fx(plan.curb_offset);
    let priority = rules.priorities.for_kind(ObjectKind::Vehicle);
    let mut vehicles = Vec::new();

    for _ in 0..plan.count {
        let Some(index) = rng.pick(network.len()) else {
            break;
        };
        let segment = &network.segments[index];
        let side = if rng.next_bool() { offset } else { -offset };
        let (center, half) = match segment.orientation {
            Orientation::Horizontal => (
                segment.center + Vec2Fixed::new(Fixed::ZERO, side),
                Vec2Fixed::new(half_length, half_width),
            ),
            Orientation::Vertical => (
                segment.center + Vec2Fixed::new(side, Fixed::ZERO),
                Vec2Fixed::new(half_width, half_length),
            ),
        };
        vehicles.push(PlaceableObject::new(
            ids.next_id(),
            ObjectKind::Vehicle,
            Footprint::rect(center, half),
            priority,
        ));
    }

    vehicles
}

/// Run every generator of a configuration: districts, then the fleet,
/// then the scatters. Ids follow creation order.
pub fn generate_objects(
    config: &LayoutConfig,
    rules: &LayoutRules,
    network: &RoadNetwork,
    rng: &mut LayoutRng,
) -> Vec<PlaceableObject> {
    let mut ids = IdAllocator::default();
    let mut obstacles = road_obstacles(network);
    let mut objects = Vec::new();

    for plan in &config.districts {
        let buildings = generate_district(plan, rules, &mut obstacles, rng, &mut ids);
        tracing::debug!(district = %plan.name, buildings = buildings.len(), "Generated district");
        objects.extend(buildings);
    }
    if let Some(fleet) = &config.fleet {
        objects.extend(generate_fleet(fleet, rules, network, rng, &mut ids));
    }
    for plan in &config.scatters {
        objects.extend(generate_scatter(plan, rules, rng, &mut ids));
    }

    objects
}
