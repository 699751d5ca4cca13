//! Road network connectivity check.
//!
//! Two tiles touch when their centers are exactly one tile apart along
//! one axis and aligned on the other. The checker builds that adjacency
//! pairwise (tile counts are in the low hundreds) and walks it
//! breadth-first to enumerate connected components.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::math::Fixed;
use crate::roads::{RoadNetwork, RoadSegment};

/// Outcome of a connectivity check.
///
/// An empty network has zero components and counts as connected
/// (vacuously); [`ConnectivityReport::is_empty`] tells that case apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityReport {
    /// Tile indices per component, in discovery order; members ascending.
    pub components: Vec<Vec<usize>>,
    /// True when there is at most one component.
    pub fully_connected: bool,
}

impl ConnectivityReport {
    /// Number of components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// True when the network had no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component sizes, in component order.
    #[must_use]
    pub fn component_sizes(&self) -> Vec<usize> {
        self.components.iter().map(Vec::len).collect()
    }

    /// Size of the largest component (zero when empty).
    #[must_use]
    pub fn largest_component(&self) -> usize {
        self.components.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Components other than the largest one (first largest wins ties).
    #[must_use]
    pub fn fragments(&self) -> Vec<&[usize]> {
        let largest = self
            .components
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.len().cmp(&b.len()).then(ib.cmp(ia)))
            .map(|(i, _)| i);
        self.components
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != largest)
            .map(|(_, c)| c.as_slice())
            .collect()
    }
}

/// Whether two tiles physically touch.
#[must_use]
pub fn tiles_adjacent(a: &RoadSegment, b: &RoadSegment, piece_size: Fixed) -> bool {
    let dx = (a.center.x - b.center.x).abs();
    let dz = (a.center.y - b.center.y).abs();
    (dx == piece_size && dz == Fixed::ZERO) || (dz == piece_size && dx == Fixed::ZERO)
}

/// Build the adjacency lists (neighbours ascending) for a tile list.
#[must_use]
pub fn adjacency(segments: &[RoadSegment], piece_size: Fixed) -> Vec<Vec<usize>> {
    let mut neighbors = vec![Vec::new(); segments.len()];
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            if tiles_adjacent(&segments[i], &segments[j], piece_size) {
                neighbors[i].push(j);
                neighbors[j].push(i);
            }
        }
    }
    neighbors
}

/// Enumerate connected components of a tile list.
#[must_use]
pub fn check_segments(segments: &[RoadSegment], piece_size: Fixed) -> ConnectivityReport {
    let neighbors = adjacency(segments, piece_size);
    let mut visited = vec![false; segments.len()];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..segments.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);
        let mut members = Vec::new();

        while let Some(node) = queue.pop_front() {
            members.push(node);
            for &next in &neighbors[node] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }

        members.sort_unstable();
        components.push(members);
    }

    let fully_connected = components.len() <= 1;
    ConnectivityReport {
        components,
        fully_connected,
    }
}

/// Check a whole road network, logging when it is fragmented.
#[must_use]
pub fn check_connectivity(network: &RoadNetwork) -> ConnectivityReport {
    let report = check_segments(&network.segments, network.piece_size);
    if report.fully_connected {
        tracing::debug!(
            tiles = network.len(),
            components = report.component_count(),
            "Road network connected"
        );
    } else {
        tracing::warn!(
            tiles = network.len(),
            components = report.component_count(),
            sizes = ?report.component_sizes(),
            "Road network is fragmented"
        );
    }
    report
}
