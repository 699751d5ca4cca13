//! Layout configuration and validated rules.
//!
//! [`LayoutConfig`] is the human-authored form (RON, `f32` values).
//! [`LayoutConfig::validate`] checks it once, before any placement runs,
//! and produces [`LayoutRules`]: the fixed-point constants that the
//! resolver and the auditor both read.

use serde::{Deserialize, Serialize};

use crate::audit::{CollisionKind, Severity};
use crate::error::{LayoutError, Result};
use crate::generators::{DistrictPlan, FleetPlan, ScatterPlan};
use crate::math::{fixed_serde, Fixed};
use crate::placement::{Category, ObjectKind};
use crate::roads::{GridLayout, RoadLayout};

/// Safety margins per category, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginConfig {
    /// Road tiles.
    pub road: f32,
    /// Buildings.
    pub building: f32,
    /// Trees.
    pub tree: f32,
    /// Rocks.
    pub rock: f32,
    /// Vehicles.
    pub vehicle: f32,
    /// Decorations.
    pub decoration: f32,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            road: 0.0,
            building: 6.0,
            tree: 3.0,
            rock: 2.0,
            vehicle: 1.0,
            decoration: 1.0,
        }
    }
}

impl MarginConfig {
    /// No margins at all.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            road: 0.0,
            building: 0.0,
            tree: 0.0,
            rock: 0.0,
            vehicle: 0.0,
            decoration: 0.0,
        }
    }

    /// Convert to fixed point. Negative or non-finite values become zero;
    /// [`LayoutConfig::validate`] rejects them before this matters.
    #[must_use]
    pub fn to_fixed(&self) -> Margins {
        let conv = |v: f32| {
            if v.is_finite() && v > 0.0 {
                Fixed::checked_from_num(v).unwrap_or(Fixed::ZERO)
            } else {
                Fixed::ZERO
            }
        };
        Margins {
            road: conv(self.road),
            building: conv(self.building),
            tree: conv(self.tree),
            rock: conv(self.rock),
            vehicle: conv(self.vehicle),
            decoration: conv(self.decoration),
        }
    }

    fn entries(&self) -> [(&'static str, f32); 6] {
        [
            ("road", self.road),
            ("building", self.building),
            ("tree", self.tree),
            ("rock", self.rock),
            ("vehicle", self.vehicle),
            ("decoration", self.decoration),
        ]
    }
}

/// Fixed-point margin table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Margins {
    /// Road tiles.
    #[serde(with = "fixed_serde")]
    pub road: Fixed,
    /// Buildings.
    #[serde(with = "fixed_serde")]
    pub building: Fixed,
    /// Trees.
    #[serde(with = "fixed_serde")]
    pub tree: Fixed,
    /// Rocks.
    #[serde(with = "fixed_serde")]
    pub rock: Fixed,
    /// Vehicles.
    #[serde(with = "fixed_serde")]
    pub vehicle: Fixed,
    /// Decorations.
    #[serde(with = "fixed_serde")]
    pub decoration: Fixed,
}

impl Margins {
    /// Margin of one category.
    #[must_use]
    pub const fn for_category(&self, category: Category) -> Fixed {
        match category {
            Category::Road => self.road,
            Category::Building => self.building,
            Category::Tree => self.tree,
            Category::Rock => self.rock,
            Category::Vehicle => self.vehicle,
            Category::Decoration => self.decoration,
        }
    }

    /// Margin applied between two categories: the larger of the two.
    #[must_use]
    pub fn pair(&self, a: Category, b: Category) -> Fixed {
        self.for_category(a).max(self.for_category(b))
    }
}

/// Severity assigned to each audited collision kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeverityTable {
    /// Tree against road.
    pub tree_road: Severity,
    /// Building against road.
    pub building_road: Severity,
    /// Tree against building.
    pub tree_building: Severity,
    /// Tree against tree.
    pub tree_tree: Severity,
    /// Building against building.
    pub building_building: Severity,
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self {
            tree_road: Severity::High,
            building_road: Severity::High,
            tree_building: Severity::Medium,
            tree_tree: Severity::Low,
            building_building: Severity::High,
        }
    }
}

impl SeverityTable {
    /// Severity of a collision kind.
    #[must_use]
    pub const fn for_kind(&self, kind: CollisionKind) -> Severity {
        match kind {
            CollisionKind::TreeRoad => self.tree_road,
            CollisionKind::BuildingRoad => self.building_road,
            CollisionKind::TreeBuilding => self.tree_building,
            CollisionKind::TreeTree => self.tree_tree,
            CollisionKind::BuildingBuilding => self.building_building,
        }
    }
}

/// Resolution priority per object kind. Higher goes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriorityTable {
    /// Buildings.
    pub building: i32,
    /// Vehicles.
    pub vehicle: i32,
    /// Rocks.
    pub rock: i32,
    /// Trees.
    pub tree: i32,
    /// Decorations.
    pub decoration: i32,
}

impl Default for PriorityTable {
    fn default() -> Self {
        Self {
            building: 100,
            vehicle: 60,
            rock: 40,
            tree: 30,
            decoration: 10,
        }
    }
}

impl PriorityTable {
    /// Priority of a kind.
    #[must_use]
    pub const fn for_kind(&self, kind: ObjectKind) -> i32 {
        match kind {
            ObjectKind::Building => self.building,
            ObjectKind::Vehicle => self.vehicle,
            ObjectKind::Rock => self.rock,
            ObjectKind::Tree => self.tree,
            ObjectKind::Decoration => self.decoration,
        }
    }
}

/// Complete configuration for one town build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Random seed for jitter and sizing.
    pub seed: u64,
    /// Road tile edge length.
    pub piece_size: f32,
    /// Road plans.
    pub roads: RoadLayout,
    /// Safety margins per category.
    pub margins: MarginConfig,
    /// Audit severity per collision kind.
    pub severities: SeverityTable,
    /// Resolution priority per object kind.
    pub priorities: PriorityTable,
    /// Length of one resolver nudge.
    pub step_length: f32,
    /// Resolver retry budget per object.
    pub max_attempts: u32,
    /// Edge length of the zones used to bucket resolution statistics.
    pub zone_size: f32,
    /// Re-rolls per building lot before it is skipped.
    pub lot_attempts: u32,
    /// Building districts.
    pub districts: Vec<DistrictPlan>,
    /// Tree, rock and decoration scatters.
    pub scatters: Vec<ScatterPlan>,
    /// Parked vehicles.
    pub fleet: Option<FleetPlan>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            piece_size: 4.0,
            roads: RoadLayout::default_town(),
            margins: MarginConfig::default(),
            severities: SeverityTable::default(),
            priorities: PriorityTable::default(),
            step_length: 1.2,
            max_attempts: 30,
            zone_size: 32.0,
            lot_attempts: 8,
            districts: DistrictPlan::default_town(),
            scatters: ScatterPlan::default_town(),
            fleet: Some(FleetPlan::default()),
        }
    }
}

impl LayoutConfig {
    /// Roads only: no generated objects.
    #[must_use]
    pub fn roads_only() -> Self {
        Self {
            districts: Vec::new(),
            scatters: Vec::new(),
            fleet: None,
            ..Default::default()
        }
    }

    /// Set the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace the margin table.
    #[must_use]
    pub const fn with_margins(mut self, margins: MarginConfig) -> Self {
        self.margins = margins;
        self
    }

    /// Set the resolver step and retry budget.
    #[must_use]
    pub fn with_resolver(mut self, step_length: f32, max_attempts: u32) -> Self {
        self.step_length = step_length;
        self.max_attempts = max_attempts;
        self
    }

    /// Parse a configuration from RON.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Config`] when the text does not parse.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        ron::from_str(ron).map_err(|e| LayoutError::config(format!("RON parse error: {e}")))
    }

    /// Serialize to pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Config`] when serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| LayoutError::config(format!("RON write error: {e}")))
    }

    /// Check every constant and plan, producing the rules placement runs on.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<LayoutRules> {
        let piece_size = positive("piece_size", self.piece_size)?;
        let step_length = positive("step_length", self.step_length)?;
        let zone_size = positive("zone_size", self.zone_size)?;

        for (name, value) in self.margins.entries() {
            if !value.is_finite() || value < 0.0 || value > MAX_MAGNITUDE {
                return Err(LayoutError::config(format!(
                    "margin '{name}' must be a non-negative number, got {value}"
                )));
            }
        }
        if self.max_attempts == 0 {
            return Err(LayoutError::config("max_attempts must be at least 1"));
        }
        if f64::from(self.step_length) * f64::from(self.max_attempts) > f64::from(MAX_MAGNITUDE) {
            return Err(LayoutError::config(format!(
                "step_length x max_attempts may move an object at most {MAX_MAGNITUDE} units"
            )));
        }
        if self.lot_attempts == 0 {
            return Err(LayoutError::config("lot_attempts must be at least 1"));
        }

        let grid = self.roads.to_grid(self.piece_size)?;

        for district in &self.districts {
            district.validate()?;
        }
        for scatter in &self.scatters {
            scatter.validate()?;
        }
        if let Some(fleet) = &self.fleet {
            fleet.validate()?;
        }

        Ok(LayoutRules {
            seed: self.seed,
            piece_size,
            margins: self.margins.to_fixed(),
            severities: self.severities,
            priorities: self.priorities,
            step_length,
            max_attempts: self.max_attempts,
            zone_size,
            lot_attempts: self.lot_attempts,
            grid,
        })
    }
}

/// Smallest accepted length, size or step.
///
/// Anything finer vanishes or divides coordinates past the fixed-point
/// range once converted.
pub const MIN_POSITIVE: f32 = 1.0 / 64.0;

/// Largest accepted coordinate magnitude or length.
pub const MAX_MAGNITUDE: f32 = 1.0e6;

/// Convert a strictly positive configuration value.
pub(crate) fn positive(name: &str, value: f32) -> Result<Fixed> {
    if !value.is_finite() || value <= 0.0 || value > MAX_MAGNITUDE {
        return Err(LayoutError::config(format!(
            "{name} must be a positive number, got {value}"
        )));
    }
    if value < MIN_POSITIVE {
        return Err(LayoutError::config(format!(
            "{name} must be at least {MIN_POSITIVE}, got {value}"
        )));
    }
    Fixed::checked_from_num(value)
        .ok_or_else(|| LayoutError::config(format!("{name} out of range: {value}")))
}

/// Convert a finite configuration value of any sign.
pub(crate) fn finite(name: &str, value: f32) -> Result<Fixed> {
    if !value.is_finite() || value.abs() > MAX_MAGNITUDE {
        return Err(LayoutError::config(format!(
            "{name} must be a finite number, got {value}"
        )));
    }
    Fixed::checked_from_num(value)
        .ok_or_else(|| LayoutError::config(format!("{name} out of range: {value}")))
}

/// Validated constants shared by the generators, the resolver and the auditor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRules {
    /// Random seed.
    pub seed: u64,
    /// Road tile edge length.
    pub piece_size: Fixed,
    /// Margin table.
    pub margins: Margins,
    /// Severity table.
    pub severities: SeverityTable,
    /// Priority table.
    pub priorities: PriorityTable,
    /// Resolver nudge length.
    pub step_length: Fixed,
    /// Resolver retry budget.
    pub max_attempts: u32,
    /// Zone edge length for statistics.
    pub zone_size: Fixed,
    /// Re-rolls per building lot.
    pub lot_attempts: u32,
    /// Road plans snapped to the tile grid.
    pub grid: GridLayout,
}
