//! Shared test utilities for the features API workspace.
//!
//! Provides the sample dataset (collections `catch` and `river`) as YAML,
//! as a loaded [`graph_store::MemoryStore`] and as a file on disk, plus the
//! `bbox` values that select known subsets of it.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../../crates/test-utils" }
//! ```
//!
//! ```ignore
//! use test_utils::{sample_store, bbox};
//! ```

pub mod fixtures;

pub use fixtures::*;
