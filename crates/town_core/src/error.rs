//! Error types for town layout generation.

use thiserror::Error;

/// Result type alias using [`LayoutError`].
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Top-level error type for the layout core.
///
/// Fragmented road networks, exhausted retry budgets and audited collisions
/// are findings, not errors; they are carried in the reports instead.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Layout configuration is inconsistent.
    #[error("Invalid layout configuration: {0}")]
    Config(String),

    /// A footprint violates its preconditions (non-positive size).
    #[error("Invalid footprint for object {id}: {reason}")]
    InvalidFootprint {
        /// Identifier of the offending object.
        id: u32,
        /// What is wrong with it.
        reason: String,
    },

    /// Failed to encode or decode a layout snapshot.
    #[error("Layout snapshot failed: {0}")]
    Snapshot(String),
}

impl LayoutError {
    /// Shorthand for a configuration error.
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
