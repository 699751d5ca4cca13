//! Layout benchmarks for town_core.
//!
//! Run with: `cargo bench -p town_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use town_core::audit::CollisionAuditor;
use town_core::config::LayoutConfig;
use town_core::connectivity::check_connectivity;
use town_core::roads::build_road_network;
use town_core::town::build_town;

/// Full build of the default town, plus its two read-only checks.
pub fn layout_benchmark(c: &mut Criterion) {
    let config = LayoutConfig::default();

    c.bench_function("build_town_default", |b| {
        b.iter(|| build_town(black_box(&config)))
    });

    let rules = config.validate().expect("default config is valid");
    let town = build_town(&config).expect("default town builds");

    c.bench_function("check_connectivity_default", |b| {
        let network = build_road_network(&rules.grid);
        b.iter(|| check_connectivity(black_box(&network)))
    });

    c.bench_function("audit_default", |b| {
        let auditor = CollisionAuditor::new(&rules);
        b.iter(|| auditor.detect_all_collisions(black_box(&town.roads), black_box(&town.objects)))
    });
}

criterion_group!(benches, layout_benchmark);
criterion_main!(benches);
