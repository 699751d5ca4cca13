//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a town build produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! A seed must always reproduce the same town. Sources of non-determinism
//! include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`town_core::math::Fixed`] for all geometry.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Layout code keeps vectors and `BTreeMap`s instead.
//!
//! - **System randomness**: Every random choice goes through a seeded
//!   [`town_core::rng::LayoutRng`].
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual stage determinism (tiling, resolution, audit)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full builds are reproducible
//! 4. **Parallel tests**: Running N builds in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use town_core::config::LayoutConfig;
use town_core::town::{build_town, TownLayout};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic build).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the build was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Layout is non-deterministic!\n\
                 Runs: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a computation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `run` - Function producing the state to compare
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```ignore
/// use town_test_utils::determinism::verify_determinism;
/// use town_core::town::build_town;
///
/// let config = LayoutConfig::default();
/// let result = verify_determinism(
///     3,
///     || build_town(&config).unwrap(),
///     |town| town.layout_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Run, HashFn>(runs: usize, run: Run, hash: HashFn) -> DeterminismResult
where
    Run: Fn() -> S,
    HashFn: Fn(&S) -> u64,
{
    let hashes: Vec<u64> = (0..runs).map(|_| hash(&run())).collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
    }
}

fn build_hash(config: &LayoutConfig) -> u64 {
    build_town(config).map_or(0, |town| town.layout_hash())
}

/// Build the same configuration twice and compare layout hashes.
///
/// A configuration that fails to build hashes to zero on every run, so it
/// is reported as deterministic.
#[must_use]
pub fn verify_town_determinism(config: &LayoutConfig) -> bool {
    verify_determinism(2, || build_hash(config), |hash| *hash).is_deterministic
}

/// Build one configuration on `num_builds` threads and collect the hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
#[must_use]
pub fn run_parallel_builds(config: &LayoutConfig, num_builds: usize) -> DeterminismResult {
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_builds)
            .map(|_| s.spawn(|| build_hash(config)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_default())
            .collect()
    });
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
    }
}

/// Verify that a bincode snapshot round-trip preserves the layout exactly.
#[must_use]
pub fn verify_snapshot_round_trip(town: &TownLayout) -> bool {
    let Ok(bytes) = town.serialize() else {
        return false;
    };
    let Ok(restored) = TownLayout::deserialize(&bytes) else {
        return false;
    };
    restored.layout_hash() == town.layout_hash() && restored == *town
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for layout testing.
///
/// These strategies generate random but reproducible footprints, objects
/// and road rows for property-based testing.
pub mod strategies {
    use proptest::prelude::*;
    use town_core::footprint::Footprint;
    use town_core::math::{Fixed, Vec2Fixed};
    use town_core::placement::{ObjectKind, PlaceableObject};
    use town_core::roads::{Orientation, RoadSegment};

    /// Generate a coordinate in quarter units.
    ///
    /// Range: -64 to 64
    pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
        (-256i32..=256i32).prop_map(|q| Fixed::from_num(q) / 4)
    }

    /// Generate a ground-plane position.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate a positive size (radius or half extent).
    ///
    /// Range: 0.25 to 6
    pub fn arb_size() -> impl Strategy<Value = Fixed> {
        (1i32..=24i32).prop_map(|q| Fixed::from_num(q) / 4)
    }

    /// Generate a non-negative margin.
    ///
    /// Range: 0 to 8
    pub fn arb_margin() -> impl Strategy<Value = Fixed> {
        (0i32..=32i32).prop_map(|q| Fixed::from_num(q) / 4)
    }

    /// Generate a circle footprint.
    pub fn arb_circle() -> impl Strategy<Value = Footprint> {
        (arb_position(), arb_size()).prop_map(|(center, radius)| Footprint::circle(center, radius))
    }

    /// Generate a box footprint.
    pub fn arb_box() -> impl Strategy<Value = Footprint> {
        (arb_position(), arb_size(), arb_size())
            .prop_map(|(center, w, d)| Footprint::rect(center, Vec2Fixed::new(w, d)))
    }

    /// Generate either footprint shape.
    pub fn arb_footprint() -> impl Strategy<Value = Footprint> {
        prop_oneof![arb_circle(), arb_box()]
    }

    /// Generate an object kind.
    pub fn arb_kind() -> impl Strategy<Value = ObjectKind> {
        prop::sample::select(ObjectKind::ALL.to_vec())
    }

    /// Generate a valid object with the footprint shape its kind uses.
    pub fn arb_object(id: u32) -> impl Strategy<Value = PlaceableObject> {
        (arb_kind(), arb_circle(), arb_box(), -50i32..150i32).prop_map(
            move |(kind, circle, rect, priority)| {
                let footprint = match kind {
                    ObjectKind::Tree | ObjectKind::Rock => circle,
                    _ => rect,
                };
                PlaceableObject::new(id, kind, footprint, priority)
            },
        )
    }

    /// Generate a list of objects with ids `0..len`.
    pub fn arb_object_list(max_objects: usize) -> impl Strategy<Value = Vec<PlaceableObject>> {
        (1..max_objects).prop_flat_map(|len| {
            (0..len)
                .map(|id| arb_object(id as u32))
                .collect::<Vec<_>>()
        })
    }

    /// Generate a set of tiles on a 4-unit grid, possibly disconnected.
    pub fn arb_tile_set(max_tiles: usize) -> impl Strategy<Value = Vec<RoadSegment>> {
        proptest::collection::btree_set((-8i32..8i32, -8i32..8i32), 0..max_tiles).prop_map(|cells| {
            cells
                .into_iter()
                .map(|(x, z)| {
                    RoadSegment::new(
                        Vec2Fixed::from_ints(x * 4, z * 4),
                        Orientation::Horizontal,
                        Fixed::from_num(4),
                    )
                })
                .collect()
        })
    }

    /// Generate a seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}
