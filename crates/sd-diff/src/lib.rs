//! Diff and patch engine for SchemaDelta.
//!
//! Compares two schema tree snapshots and produces a minimal, deterministic
//! [`SchemaDelta`]; applies that delta in place to another copy of the
//! before-state to reproduce the after-state. A delta computed once can be
//! shipped to every replica that holds the same pre-image.
//!
//! # Key Types
//!
//! - [`SchemaDelta`] -- Recursive description of attribute, child and order changes
//! - [`compute_diff`] / [`apply_diff`] -- The two engine entry points
//! - [`EngineConfig`] -- Engine settings
//! - [`DiffError`] / [`PatchError`] -- Diff rejection and fatal patch faults

pub mod apply;
pub mod compute;
pub mod config;
pub mod delta;
pub mod error;

pub use apply::{apply_diff, apply_diff_owned, apply_diff_owned_with, apply_diff_with, validate_diff};
pub use compute::{compute_diff, compute_diff_with};
pub use config::EngineConfig;
pub use delta::SchemaDelta;
pub use error::{DiffError, DiffResult, PatchError, PatchResult};
