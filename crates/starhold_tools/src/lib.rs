//! # Starhold Development Tools
//!
//! Command-line tools for development:
//! - Data validators for the building catalog and economy config
//! - Cost and build-time tables
//! - Colonization quotes and resource projections

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod error;
pub mod report;
pub mod validate;
