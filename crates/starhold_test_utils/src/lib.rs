//! # Starhold Test Utilities
//!
//! Shared testing utilities for all crates:
//! - World fixtures (pre-seeded stores, planets and colonies)
//! - Determinism harness for scripted engine scenarios
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;
