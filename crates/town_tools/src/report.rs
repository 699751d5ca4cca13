//! Human and machine readable renderings of a built town.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use town_core::audit::AuditSummary;
use town_core::resolver::ZoneId;
use town_core::town::TownLayout;

use crate::validate::ToolError;

/// Headline numbers for one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TownSummary {
    /// Seed the town was built with.
    pub seed: u64,
    /// Road tiles.
    pub tiles: usize,
    /// Road crossings.
    pub intersections: usize,
    /// Connected road components.
    pub components: usize,
    /// Whether the road network is one piece.
    pub fully_connected: bool,
    /// Placed objects.
    pub objects: usize,
    /// Objects the resolver moved.
    pub adjusted: usize,
    /// Objects that ran out of attempts.
    pub exhausted: usize,
    /// Zones with disproportionately many adjustments.
    pub hotspots: Vec<ZoneId>,
    /// Stable layout fingerprint.
    pub layout_hash: u64,
    /// Audit breakdown.
    pub audit: AuditSummary,
}

impl TownSummary {
    /// Summarize a built town.
    #[must_use]
    pub fn of(town: &TownLayout) -> Self {
        Self {
            seed: town.seed,
            tiles: town.roads.len(),
            intersections: town.roads.intersections.len(),
            components: town.connectivity.component_count(),
            fully_connected: town.connectivity.fully_connected,
            objects: town.objects.len(),
            adjusted: town.resolution.adjusted_count(),
            exhausted: town.resolution.exhausted_count(),
            hotspots: town.resolution.hotspots().into_iter().map(|(zone, _)| zone).collect(),
            layout_hash: town.layout_hash(),
            audit: town.audit.summary(),
        }
    }
}

/// Full text report: roads, resolution statistics and the audit.
#[must_use]
pub fn render_text(town: &TownLayout) -> String {
    let mut out = String::new();
    let summary = TownSummary::of(town);

    let _ = writeln!(out, "Town (seed {}, hash {:016x})", summary.seed, summary.layout_hash);
    let _ = writeln!(
        out,
        "Roads: {} tiles, {} intersections, {} component(s)",
        summary.tiles, summary.intersections, summary.components
    );
    if !summary.fully_connected {
        let _ = writeln!(
            out,
            "  WARNING: road network is fragmented, sizes {:?}",
            town.connectivity.component_sizes()
        );
    }
    let _ = writeln!(out);
    let _ = write!(out, "{}", town.resolution);
    let _ = writeln!(out);
    out.push_str(&render_audit(town));
    out
}

/// Audit section only, with one line per collision.
#[must_use]
pub fn render_audit(town: &TownLayout) -> String {
    let mut out = town.audit.summary().to_string();
    for record in &town.audit.records {
        let _ = writeln!(
            out,
            "  [{}] {}: {} vs {}",
            record.severity, record.kind, record.first, record.second
        );
    }
    out
}

/// JSON dump of the whole layout plus its summary.
///
/// # Errors
///
/// Returns [`ToolError::Json`] if encoding fails.
pub fn render_json(town: &TownLayout) -> Result<String, ToolError> {
    #[derive(Serialize)]
    struct Dump<'a> {
        summary: TownSummary,
        layout: &'a TownLayout,
    }

    let dump = Dump {
        summary: TownSummary::of(town),
        layout: town,
    };
    Ok(serde_json::to_string_pretty(&dump)?)
}
