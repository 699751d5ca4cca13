//! # Town Core
//!
//! Deterministic placement and validation core for procedural towns.
//!
//! This crate contains **only** layout logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point geometry (uses fixed-point)
//!
//! Given the same configuration and seed, a build produces the same road
//! tiles, the same object positions and the same audit, on every platform.
//!
//! ## Crate Structure
//!
//! - [`roads`] - Road plans snapped to a tile grid, intersections
//! - [`connectivity`] - Connected components of the road tiles
//! - [`footprint`] - Box and circle overlap tests
//! - [`placement`] - Margins-aware placement safety predicate
//! - [`resolver`] - Iterative nudge resolver and its statistics
//! - [`audit`] - Read-only collision audit with severities
//! - [`generators`] - Building districts, scatters and parked vehicles
//! - [`town`] - The full build pipeline
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod audit;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod footprint;
pub mod generators;
pub mod math;
pub mod placement;
pub mod resolver;
pub mod rng;
pub mod roads;
pub mod town;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::audit::{
        AuditStatus, AuditSummary, CollisionAudit, CollisionAuditor, CollisionKind,
        CollisionRecord, Severity,
    };
    pub use crate::config::{LayoutConfig, LayoutRules, MarginConfig, Margins};
    pub use crate::connectivity::{check_connectivity, ConnectivityReport};
    pub use crate::error::{LayoutError, Result};
    pub use crate::footprint::Footprint;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::placement::{is_placement_safe, Category, ObjectKind, Obstacle, PlaceableObject};
    pub use crate::resolver::{PlacementResolver, ResolutionReport};
    pub use crate::rng::LayoutRng;
    pub use crate::roads::{build_road_network, RoadLayout, RoadNetwork, RoadSegment};
    pub use crate::town::{build_town, TownLayout};
}
