//! Rigforge End-to-End Test Infrastructure
//!
//! This crate provides integration tests for the full synthesis pipeline:
//!
//! - Synthesis: source skeleton -> control rig document
//! - Determinism: identical canonical hashes across repeated runs
//! - Module semantics: switch regions, twist tables, spring remaps
//! - Pipeline: request file -> generate -> rig file -> lint
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p rigforge-tests
//! ```
//!
//! ## Determinism Testing
//!
//! The `determinism` module runs a generation closure several times and
//! compares the serialized outputs byte for byte:
//!
//! ```rust,ignore
//! use rigforge_tests::determinism::verify_determinism;
//!
//! let result = verify_determinism(|| serde_json::to_vec(&build_rig()).unwrap(), 3);
//! assert!(result.is_deterministic);
//! ```

pub mod determinism;
pub mod fixtures;

// Re-export commonly used items
pub use determinism::{
    assert_deterministic, compute_hash, verify_determinism, verify_hash_determinism,
    DeterminismResult,
};
