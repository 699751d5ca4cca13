//! Read-only collision audit over a finished layout.
//!
//! The auditor scans every meaningful pair of static geometry with the
//! same predicate and margins the resolver used, and classifies what it
//! finds. It never moves anything; its output feeds logs and the
//! developer re-check command.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{LayoutRules, Margins, SeverityTable};
use crate::error::{LayoutError, Result};
use crate::footprint::Footprint;
use crate::math::Vec2Fixed;
use crate::placement::{footprints_conflict, Category, ObjectKind, PlaceableObject};
use crate::roads::RoadNetwork;

/// Pair categories the auditor checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollisionKind {
    /// Tree overlapping a road tile.
    TreeRoad,
    /// Building overlapping a road tile.
    BuildingRoad,
    /// Tree overlapping a building.
    TreeBuilding,
    /// Two trees overlapping.
    TreeTree,
    /// Two buildings overlapping.
    BuildingBuilding,
}

impl CollisionKind {
    /// Every kind, in report order.
    pub const ALL: [Self; 5] = [
        Self::TreeRoad,
        Self::BuildingRoad,
        Self::TreeBuilding,
        Self::TreeTree,
        Self::BuildingBuilding,
    ];

    /// Hyphenated label, e.g. `tree-road`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TreeRoad => "tree-road",
            Self::BuildingRoad => "building-road",
            Self::TreeBuilding => "tree-building",
            Self::TreeTree => "tree-tree",
            Self::BuildingBuilding => "building-building",
        }
    }
}

impl fmt::Display for CollisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Triage label for a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Cosmetic.
    Low,
    /// Worth a look.
    Medium,
    /// Breaks the scene.
    High,
}

impl Severity {
    /// Every severity, most severe first.
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// One side of a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// What it is.
    pub category: Category,
    /// Tile index for roads, object id otherwise.
    pub index: u32,
    /// Center at audit time.
    pub center: Vec2Fixed,
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} at {}", self.category, self.index, self.center)
    }
}

/// A detected overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionRecord {
    /// Pair category.
    pub kind: CollisionKind,
    /// Tree or building side (the first word of the kind label).
    pub first: Participant,
    /// Other side.
    pub second: Participant,
    /// Severity from the configured table.
    pub severity: Severity,
}

/// Whether an audit found anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    /// No collisions at all.
    Clean,
    /// This many collisions.
    CollisionsFound(usize),
}

/// Counts per kind and per severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Overall status.
    pub status: AuditStatus,
    /// Count per kind (every kind present, zero included).
    pub per_kind: BTreeMap<CollisionKind, usize>,
    /// Count per severity (every severity present, zero included).
    pub per_severity: BTreeMap<Severity, usize>,
}

impl fmt::Display for AuditSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            AuditStatus::Clean => return writeln!(f, "Collision audit: no collisions detected"),
            AuditStatus::CollisionsFound(total) => {
                writeln!(f, "Collision audit: {total} collisions")?;
            }
        }
        writeln!(f, "  by severity:")?;
        for severity in Severity::ALL {
            let count = self.per_severity.get(&severity).copied().unwrap_or(0);
            writeln!(f, "    {severity:<8} {count}")?;
        }
        writeln!(f, "  by kind:")?;
        for kind in CollisionKind::ALL {
            let count = self.per_kind.get(&kind).copied().unwrap_or(0);
            if count > 0 {
                writeln!(f, "    {:<18} {count}", kind.label())?;
            }
        }
        Ok(())
    }
}

/// Result of one audit pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionAudit {
    /// Every collision, grouped by kind in scan order.
    pub records: Vec<CollisionRecord>,
}

impl CollisionAudit {
    /// Clean or not.
    #[must_use]
    pub fn status(&self) -> AuditStatus {
        if self.records.is_empty() {
            AuditStatus::Clean
        } else {
            AuditStatus::CollisionsFound(self.records.len())
        }
    }

    /// True when nothing collides.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one kind.
    pub fn by_kind(&self, kind: CollisionKind) -> impl Iterator<Item = &CollisionRecord> {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    /// Records of one severity.
    pub fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &CollisionRecord> {
        self.records.iter().filter(move |r| r.severity == severity)
    }

    /// Number of records of one kind.
    #[must_use]
    pub fn count_of(&self, kind: CollisionKind) -> usize {
        self.by_kind(kind).count()
    }

    /// Grouped counts.
    #[must_use]
    pub fn summary(&self) -> AuditSummary {
        let mut per_kind: BTreeMap<CollisionKind, usize> =
            CollisionKind::ALL.iter().map(|&k| (k, 0)).collect();
        let mut per_severity: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|&s| (s, 0)).collect();
        for record in &self.records {
            *per_kind.entry(record.kind).or_default() += 1;
            *per_severity.entry(record.severity).or_default() += 1;
        }
        AuditSummary {
            status: self.status(),
            per_kind,
            per_severity,
        }
    }
}

struct Item {
    participant: Participant,
    footprint: Footprint,
}

/// Exhaustive pairwise collision scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionAuditor {
    margins: Margins,
    severities: SeverityTable,
}

impl CollisionAuditor {
    /// Auditor using the validated rules.
    #[must_use]
    pub const fn new(rules: &LayoutRules) -> Self {
        Self {
            margins: rules.margins,
            severities: rules.severities,
        }
    }

    /// Auditor with explicit tables.
    #[must_use]
    pub const fn with_tables(margins: Margins, severities: SeverityTable) -> Self {
        Self {
            margins,
            severities,
        }
    }

    /// Scan tree–road, building–road, tree–building, tree–tree and
    /// building–building pairs. Rocks, vehicles and decorations are not
    /// audited.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidFootprint`] if an audited object has a
    /// non-positive size.
    pub fn detect_all_collisions(
        &self,
        network: &RoadNetwork,
        objects: &[PlaceableObject],
    ) -> Result<CollisionAudit> {
        let mut trees = Vec::new();
        let mut buildings = Vec::new();
        for object in objects {
            let bucket = match object.kind {
                ObjectKind::Tree => &mut trees,
                ObjectKind::Building => &mut buildings,
                _ => continue,
            };
            if let Some(reason) = object.footprint.defect() {
                return Err(LayoutError::InvalidFootprint {
                    id: object.id,
                    reason,
                });
            }
            bucket.push(Item {
                participant: Participant {
                    category: object.category(),
                    index: object.id,
                    center: object.center(),
                },
                footprint: object.footprint,
            });
        }
        let roads: Vec<Item> = network
            .segments
            .iter()
            .enumerate()
            .map(|(i, segment)| Item {
                participant: Participant {
                    category: Category::Road,
                    index: i as u32,
                    center: segment.center,
                },
                footprint: segment.footprint(),
            })
            .collect();

        let mut records = Vec::new();
        self.scan_cross(CollisionKind::TreeRoad, &trees, &roads, &mut records);
        self.scan_cross(CollisionKind::BuildingRoad, &buildings, &roads, &mut records);
        self.scan_cross(CollisionKind::TreeBuilding, &trees, &buildings, &mut records);
        self.scan_within(CollisionKind::TreeTree, &trees, &mut records);
        self.scan_within(CollisionKind::BuildingBuilding, &buildings, &mut records);

        let audit = CollisionAudit { records };
        if audit.is_clean() {
            tracing::info!("Collision audit clean");
        } else {
            let summary = audit.summary();
            tracing::warn!(
                total = audit.records.len(),
                high = summary.per_severity.get(&Severity::High).copied().unwrap_or(0),
                medium = summary.per_severity.get(&Severity::Medium).copied().unwrap_or(0),
                low = summary.per_severity.get(&Severity::Low).copied().unwrap_or(0),
                "Collision audit found overlaps"
            );
        }
        Ok(audit)
    }

    fn record(&self, kind: CollisionKind, a: &Item, b: &Item, out: &mut Vec<CollisionRecord>) {
        if footprints_conflict(
            &a.footprint,
            a.participant.category,
            &b.footprint,
            b.participant.category,
            &self.margins,
        ) {
            out.push(CollisionRecord {
                kind,
                first: a.participant,
                second: b.participant,
                severity: self.severities.for_kind(kind),
            });
        }
    }

    fn scan_cross(&self, kind: CollisionKind, left: &[Item], right: &[Item], out: &mut Vec<CollisionRecord>) {
        for a in left {
            for b in right {
                self.record(kind, a, b, out);
            }
        }
    }

    fn scan_within(&self, kind: CollisionKind, items: &[Item], out: &mut Vec<CollisionRecord>) {
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                self.record(kind, a, b, out);
            }
        }
    }
}
