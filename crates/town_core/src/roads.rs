//! Road network builder.
//!
//! A town's streets are described by a handful of named [`RoadPlan`]s
//! (arterials, residential streets, connectors) at fixed coordinates.
//! Validation snaps every plan onto the tile grid and rejects anything
//! that would not land exactly on grid cells; the builder then walks
//! each plan one tile at a time, in plan order, so the output is fully
//! deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{positive, MAX_MAGNITUDE};
use crate::error::{LayoutError, Result};
use crate::footprint::Footprint;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Direction a road runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Orientation {
    /// Runs along X.
    #[default]
    Horizontal,
    /// Runs along Z.
    Vertical,
}

/// Functional class of a road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RoadClass {
    /// Main through-route.
    Arterial,
    /// Street serving a neighbourhood.
    #[default]
    Residential,
    /// Short link joining other roads.
    Connector,
}

/// A named straight road in world units.
///
/// A horizontal plan covers `x` in `from..=to` at `z = at`; a vertical
/// plan covers `z` in `from..=to` at `x = at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadPlan {
    /// Street name.
    pub name: String,
    /// Road class.
    pub class: RoadClass,
    /// Direction.
    pub orientation: Orientation,
    /// Fixed cross-axis coordinate.
    pub at: f32,
    /// First tile center along the road.
    pub from: f32,
    /// Last tile center along the road (inclusive).
    pub to: f32,
}

impl RoadPlan {
    /// Road running along X at `z`.
    #[must_use]
    pub fn horizontal(name: &str, class: RoadClass, z: f32, from: f32, to: f32) -> Self {
        Self {
            name: name.to_string(),
            class,
            orientation: Orientation::Horizontal,
            at: z,
            from,
            to,
        }
    }

    /// Road running along Z at `x`.
    #[must_use]
    pub fn vertical(name: &str, class: RoadClass, x: f32, from: f32, to: f32) -> Self {
        Self {
            name: name.to_string(),
            class,
            orientation: Orientation::Vertical,
            at: x,
            from,
            to,
        }
    }
}

/// The full set of road plans for a town.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadLayout {
    /// Plans in build order.
    pub plans: Vec<RoadPlan>,
}

impl Default for RoadLayout {
    fn default() -> Self {
        Self::default_town()
    }
}

impl RoadLayout {
    /// The reference town for a 4-unit tile: two crossing arterials, a
    /// ring of four residential streets and two outlying connectors.
    #[must_use]
    pub fn default_town() -> Self {
        use RoadClass::{Arterial, Connector, Residential};
        Self {
            plans: vec![
                RoadPlan::horizontal("Main Street", Arterial, 0.0, -96.0, 96.0),
                RoadPlan::vertical("Central Avenue", Arterial, 0.0, -96.0, 96.0),
                RoadPlan::horizontal("North Lane", Residential, -48.0, -64.0, 64.0),
                RoadPlan::horizontal("South Lane", Residential, 48.0, -64.0, 64.0),
                RoadPlan::vertical("West Street", Residential, -48.0, -64.0, 64.0),
                RoadPlan::vertical("East Street", Residential, 48.0, -64.0, 64.0),
                RoadPlan::horizontal("Mill Road", Connector, 80.0, 0.0, 32.0),
                RoadPlan::vertical("Harbor Link", Connector, 80.0, -32.0, 0.0),
            ],
        }
    }

    /// Snap every plan onto the tile grid.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Config`] when a coordinate is not a whole
    /// number of tiles, a span is reversed, a name is empty, or two plans
    /// of the same orientation claim the same tile.
    pub fn to_grid(&self, piece_size: f32) -> Result<GridLayout> {
        let piece = positive("road piece size", piece_size)?;

        let mut roads = Vec::with_capacity(self.plans.len());
        let mut claimed: BTreeMap<(i32, i32), (Orientation, usize)> = BTreeMap::new();

        for plan in &self.plans {
            if plan.name.trim().is_empty() {
                return Err(LayoutError::config("road plan with an empty name"));
            }
            let line = tiles(piece_size, plan.at, &plan.name, "at")?;
            let first = tiles(piece_size, plan.from, &plan.name, "from")?;
            let last = tiles(piece_size, plan.to, &plan.name, "to")?;
            if first > last {
                return Err(LayoutError::config(format!(
                    "road '{}' runs backwards ({} > {})",
                    plan.name, plan.from, plan.to
                )));
            }

            let road_index = roads.len();
            for t in first..=last {
                let cell = cell_of(plan.orientation, line, t);
                if let Some(&(orientation, other)) = claimed.get(&cell) {
                    if orientation == plan.orientation {
                        let other: &GridRoad = &roads[other];
                        return Err(LayoutError::config(format!(
                            "roads '{}' and '{}' overlap at tile ({}, {})",
                            other.name, plan.name, cell.0, cell.1
                        )));
                    }
                } else {
                    claimed.insert(cell, (plan.orientation, road_index));
                }
            }

            roads.push(GridRoad {
                name: plan.name.clone(),
                class: plan.class,
                orientation: plan.orientation,
                line,
                first,
                last,
            });
        }

        Ok(GridLayout {
            piece_size: piece,
            roads,
        })
    }
}

/// Convert a world coordinate to a whole tile count.
fn tiles(piece_size: f32, value: f32, road: &str, field: &str) -> Result<i32> {
    if !value.is_finite() || value.abs() > MAX_MAGNITUDE {
        return Err(LayoutError::config(format!(
            "road '{road}' has an out-of-range '{field}': {value}"
        )));
    }
    let count = value / piece_size;
    let rounded = count.round();
    if (count - rounded).abs() > 1e-4 || rounded.abs() > 1e6 {
        return Err(LayoutError::config(format!(
            "road '{road}': '{field}' = {value} is not a multiple of the {piece_size} unit tile"
        )));
    }
    Ok(rounded as i32)
}

const fn cell_of(orientation: Orientation, line: i32, t: i32) -> (i32, i32) {
    match orientation {
        Orientation::Horizontal => (t, line),
        Orientation::Vertical => (line, t),
    }
}

/// A road plan expressed in tile indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRoad {
    /// Street name.
    pub name: String,
    /// Road class.
    pub class: RoadClass,
    /// Direction.
    pub orientation: Orientation,
    /// Cross-axis tile index.
    pub line: i32,
    /// First tile index along the road.
    pub first: i32,
    /// Last tile index along the road (inclusive).
    pub last: i32,
}

/// Validated road plans on a fixed tile grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Tile edge length.
    #[serde(with = "fixed_serde")]
    pub piece_size: Fixed,
    /// Roads in build order.
    pub roads: Vec<GridRoad>,
}

/// One road tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoadSegment {
    /// Tile center.
    pub center: Vec2Fixed,
    /// Direction of the road this tile belongs to.
    pub orientation: Orientation,
    /// Tile edge length.
    #[serde(with = "fixed_serde")]
    pub size: Fixed,
    /// Class of the owning road.
    pub class: RoadClass,
}

impl RoadSegment {
    /// Create a residential tile.
    #[must_use]
    pub const fn new(center: Vec2Fixed, orientation: Orientation, size: Fixed) -> Self {
        Self {
            center,
            orientation,
            size,
            class: RoadClass::Residential,
        }
    }

    /// Square footprint of the tile.
    #[must_use]
    pub fn footprint(&self) -> Footprint {
        let half = self.size / Fixed::from_num(2);
        Footprint::rect(self.center, Vec2Fixed::new(half, half))
    }
}

/// Marker where two roads cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Intersection {
    /// Center of the shared tile.
    pub center: Vec2Fixed,
}

/// Road tiles and intersections for one build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoadNetwork {
    /// Tile edge length.
    #[serde(with = "fixed_serde")]
    pub piece_size: Fixed,
    /// Tiles in build order.
    pub segments: Vec<RoadSegment>,
    /// Crossings in discovery order.
    pub intersections: Vec<Intersection>,
}

impl RoadNetwork {
    /// Wrap an explicit tile list (no intersections are derived).
    #[must_use]
    pub const fn from_segments(piece_size: Fixed, segments: Vec<RoadSegment>) -> Self {
        Self {
            piece_size,
            segments,
            intersections: Vec::new(),
        }
    }

    /// Number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when there are no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Lay down every tile of a validated layout.
///
/// Where a road crosses a tile already laid by a road of the other
/// orientation, the existing tile is kept and an [`Intersection`] is
/// recorded instead.
#[must_use]
pub fn build_road_network(layout: &GridLayout) -> RoadNetwork {
    let piece = layout.piece_size;
    let mut segments = Vec::new();
    let mut intersections = Vec::new();
    let mut occupied: BTreeMap<(i32, i32), bool> = BTreeMap::new();

    for road in &layout.roads {
        for t in road.first..=road.last {
            let cell = cell_of(road.orientation, road.line, t);
            let center = Vec2Fixed::new(
                Fixed::from_num(cell.0) * piece,
                Fixed::from_num(cell.1) * piece,
            );
            match occupied.get_mut(&cell) {
                Some(crossed) => {
                    if !*crossed {
                        *crossed = true;
                        intersections.push(Intersection { center });
                    }
                }
                None => {
                    occupied.insert(cell, false);
                    segments.push(RoadSegment {
                        center,
                        orientation: road.orientation,
                        size: piece,
                        class: road.class,
                    });
                }
            }
        }
    }

    tracing::debug!(
        roads = layout.roads.len(),
        tiles = segments.len(),
        intersections = intersections.len(),
        "Built road network"
    );

    RoadNetwork {
        piece_size: piece,
        segments,
        intersections,
    }
}
