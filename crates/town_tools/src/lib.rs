//! # Town Development Tools
//!
//! Command-line tools for development:
//! - Town generator with text and JSON reports
//! - Config validator
//! - On-demand collision re-check

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod report;
pub mod validate;
