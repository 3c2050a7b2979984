//! Core Pythagoras-tree generation library.
//!
//! Main components:
//! - [`geometry`] — child-triangle metrics with a memo cache.
//! - [`tree`] — triangle nodes, child expansion and whole-tree generation.
//! - [`pipeline`] — pointer/timer events joined into root parameters.
//! - [`scale`] — piecewise-linear mappings from surface to parameters.
//! - [`config`] — layout and growth configuration.
//! - [`palette`] — the viridis ramp used to colour nodes by level.
//! - [`types`] — shared type aliases and IDs.

pub mod config;
pub mod geometry;
pub mod palette;
pub mod pipeline;
pub mod scale;
pub mod tree;
pub mod types;
