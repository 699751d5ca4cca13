//! Plan-view footprints and the pairwise overlap tests.
//!
//! Two shapes exist: axis-aligned boxes (roads, buildings, vehicles,
//! decorations) and circles (trees, rocks). Every test is total and
//! symmetric in its two arguments. Touching at exactly the allowance is
//! not an overlap.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// 2D footprint used for overlap tests, ignoring vertical extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Footprint {
    /// Axis-aligned rectangle.
    Box {
        /// Center on the ground plane.
        center: Vec2Fixed,
        /// Half width (x) and half depth (z).
        half_extents: Vec2Fixed,
    },
    /// Circle.
    Circle {
        /// Center on the ground plane.
        center: Vec2Fixed,
        /// Radius.
        #[serde(with = "fixed_serde")]
        radius: Fixed,
    },
}

impl Footprint {
    /// Create a box footprint.
    #[must_use]
    pub const fn rect(center: Vec2Fixed, half_extents: Vec2Fixed) -> Self {
        Self::Box {
            center,
            half_extents,
        }
    }

    /// Create a circle footprint.
    #[must_use]
    pub const fn circle(center: Vec2Fixed, radius: Fixed) -> Self {
        Self::Circle { center, radius }
    }

    /// Center of the footprint.
    #[must_use]
    pub const fn center(&self) -> Vec2Fixed {
        match *self {
            Self::Box { center, .. } | Self::Circle { center, .. } => center,
        }
    }

    /// Copy of this footprint moved to a new center.
    #[must_use]
    pub const fn with_center(self, center: Vec2Fixed) -> Self {
        match self {
            Self::Box { half_extents, .. } => Self::Box {
                center,
                half_extents,
            },
            Self::Circle { radius, .. } => Self::Circle { center, radius },
        }
    }

    /// Returns true for circle footprints.
    #[must_use]
    pub const fn is_circle(&self) -> bool {
        matches!(self, Self::Circle { .. })
    }

    /// Describe why the footprint is malformed, if it is.
    ///
    /// Fixed-point coordinates cannot be NaN, so only sizes are checked.
    #[must_use]
    pub fn defect(&self) -> Option<String> {
        match *self {
            Self::Box { half_extents, .. } => {
                if half_extents.x <= Fixed::ZERO || half_extents.y <= Fixed::ZERO {
                    Some(format!("half extents must be positive, got {half_extents}"))
                } else {
                    None
                }
            }
            Self::Circle { radius, .. } => {
                if radius <= Fixed::ZERO {
                    Some(format!("radius must be positive, got {radius}"))
                } else {
                    None
                }
            }
        }
    }

    /// Whether two footprints overlap once `margin` is added to the allowance.
    ///
    /// Box–box uses per-axis separation, circle–circle uses center
    /// distance, and circle–box measures from the circle center to the
    /// closest point of the box.
    #[must_use]
    pub fn overlaps(&self, other: &Self, margin: Fixed) -> bool {
        match (*self, *other) {
            (
                Self::Box {
                    center: c1,
                    half_extents: h1,
                },
                Self::Box {
                    center: c2,
                    half_extents: h2,
                },
            ) => boxes_overlap(c1, h1, c2, h2, margin),
            (
                Self::Circle {
                    center: c1,
                    radius: r1,
                },
                Self::Circle {
                    center: c2,
                    radius: r2,
                },
            ) => circles_overlap(c1, r1, c2, r2, margin),
            (
                Self::Circle { center, radius },
                Self::Box {
                    center: box_center,
                    half_extents,
                },
            )
            | (
                Self::Box {
                    center: box_center,
                    half_extents,
                },
                Self::Circle { center, radius },
            ) => circle_box_overlap(center, radius, box_center, half_extents, margin),
        }
    }
}

/// Axis-aligned box test: `|dx| < hw1 + hw2 + m` and `|dz| < hd1 + hd2 + m`.
#[must_use]
pub fn boxes_overlap(
    c1: Vec2Fixed,
    h1: Vec2Fixed,
    c2: Vec2Fixed,
    h2: Vec2Fixed,
    margin: Fixed,
) -> bool {
    let dx = (c1.x - c2.x).abs();
    let dz = (c1.y - c2.y).abs();
    dx < h1.x + h2.x + margin && dz < h1.y + h2.y + margin
}

/// Circle test on squared distances: `d² < (r1 + r2 + m)²`.
#[must_use]
pub fn circles_overlap(c1: Vec2Fixed, r1: Fixed, c2: Vec2Fixed, r2: Fixed, margin: Fixed) -> bool {
    c1.within(c2, r1 + r2 + margin)
}

/// Circle against box via the closest point of the box to the circle center.
#[must_use]
pub fn circle_box_overlap(
    center: Vec2Fixed,
    radius: Fixed,
    box_center: Vec2Fixed,
    half_extents: Vec2Fixed,
    margin: Fixed,
) -> bool {
    let closest = Vec2Fixed::new(
        center
            .x
            .clamp(box_center.x - half_extents.x, box_center.x + half_extents.x),
        center
            .y
            .clamp(box_center.y - half_extents.y, box_center.y + half_extents.y),
    );
    center.within(closest, radius + margin)
}
