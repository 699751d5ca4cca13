//! Test fixtures and helpers.
//!
//! Small scenes and configurations for consistent testing.

use fixed::types::I32F32;
use serde::de::DeserializeOwned;
use serde::Serialize;
use town_core::config::{LayoutConfig, MarginConfig};
use town_core::footprint::Footprint;
use town_core::math::Vec2Fixed;
use town_core::placement::{ObjectKind, PlaceableObject};
use town_core::roads::{Orientation, RoadNetwork, RoadSegment};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real layout code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a ground-plane point from floats.
#[must_use]
pub fn point(x: f64, z: f64) -> Vec2Fixed {
    Vec2Fixed::new(fixed_f(x), fixed_f(z))
}

/// A tree with the default tree priority.
#[must_use]
pub fn tree(id: u32, x: f64, z: f64, radius: f64) -> PlaceableObject {
    PlaceableObject::new(
        id,
        ObjectKind::Tree,
        Footprint::circle(point(x, z), fixed_f(radius)),
        30,
    )
}

/// A building with the default building priority.
#[must_use]
pub fn building(id: u32, x: f64, z: f64, half_width: f64, half_depth: f64) -> PlaceableObject {
    PlaceableObject::new(
        id,
        ObjectKind::Building,
        Footprint::rect(point(x, z), point(half_width, half_depth)),
        100,
    )
}

/// A rock with the default rock priority.
#[must_use]
pub fn rock(id: u32, x: f64, z: f64, radius: f64) -> PlaceableObject {
    PlaceableObject::new(
        id,
        ObjectKind::Rock,
        Footprint::circle(point(x, z), fixed_f(radius)),
        40,
    )
}

/// A horizontal row of `count` adjacent tiles along `z`, starting at `x0`.
#[must_use]
pub fn road_row(x0: i32, z: i32, count: i32, piece_size: i32) -> Vec<RoadSegment> {
    (0..count)
        .map(|i| {
            RoadSegment::new(
                Vec2Fixed::from_ints(x0 + i * piece_size, z),
                Orientation::Horizontal,
                fixed(piece_size),
            )
        })
        .collect()
}

/// A network holding a single row of 4-unit tiles centred on the origin.
#[must_use]
pub fn straight_road(count: i32) -> RoadNetwork {
    let x0 = -(count / 2) * 4;
    RoadNetwork::from_segments(fixed(4), road_row(x0, 0, count, 4))
}

/// Default town roads with no generated objects and no margins.
#[must_use]
pub fn bare_config() -> LayoutConfig {
    LayoutConfig::roads_only().with_margins(MarginConfig::zero())
}

/// A compact configuration in RON, as a user would write it.
pub const SAMPLE_CONFIG_RON: &str = r#"(
    seed: 7,
    piece_size: 4.0,
    step_length: 1.0,
    max_attempts: 20,
    zone_size: 16.0,
    roads: (
        plans: [
            (name: "High Street", class: Arterial, orientation: Horizontal, at: 0.0, from: -32.0, to: 32.0),
            (name: "Church Lane", class: Residential, orientation: Vertical, at: 0.0, from: -32.0, to: 32.0),
        ],
    ),
    districts: [],
    scatters: [
        (name: "Green", kind: Tree, center: (16.0, 16.0), spread: 8.0, count: 6, min_size: 0.8, max_size: 1.5),
    ],
    fleet: None,
)"#;

/// Parse [`SAMPLE_CONFIG_RON`].
///
/// # Panics
///
/// Panics if the sample no longer parses.
#[must_use]
pub fn sample_config() -> LayoutConfig {
    ron::from_str(SAMPLE_CONFIG_RON).expect("sample config parses")
}

/// Write a value to RON and read it back.
///
/// # Panics
///
/// Panics if either direction fails.
#[must_use]
pub fn ron_round_trip<T: Serialize + DeserializeOwned>(value: &T) -> T {
    let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .expect("value serializes to RON");
    ron::from_str(&text).expect("RON parses back")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_helpers() {
        assert_eq!(fixed(3), I32F32::from_num(3));
        assert_eq!(fixed_f(0.5) * fixed(2), fixed(1));
    }

    #[test]
    fn test_straight_road_is_centred() {
        let network = straight_road(5);
        let xs: Vec<i32> = network
            .segments
            .iter()
            .map(|s| s.center.x.to_num::<i32>())
            .collect();
        assert_eq!(xs, vec![-8, -4, 0, 4, 8]);
    }

    #[test]
    fn test_sample_config_is_valid() {
        let config = sample_config();
        assert_eq!(config.seed, 7);
        assert_eq!(config.scatters.len(), 1);
        assert!(config.fleet.is_none());
        let rules = config.validate().unwrap();
        assert_eq!(rules.max_attempts, 20);
    }

    #[test]
    fn test_default_config_survives_ron() {
        let config = LayoutConfig::default();
        assert_eq!(ron_round_trip(&config), config);
    }
}
