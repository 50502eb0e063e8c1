//! Common types and utilities for the metagraph metamodel engine.
//!
//! This crate provides foundational types used across all metagraph crates:
//! - String interning (`Atom`, `ShardedInterner`)
//! - Centralized limits and thresholds

// String interning for node and property names
pub mod interner;
pub use interner::{Atom, ShardedInterner};

// Centralized limits and thresholds
pub mod limits;
