//! Rigforge Input Contract Library
//!
//! This crate provides the types, validation, and hashing for rig synthesis
//! inputs: the source deform skeleton, the collaborating triangle meshes,
//! and the generator options. Backends consume these types and produce a
//! serialized control-rig document; this crate never mutates its inputs.
//!
//! # Example
//!
//! ```
//! use rigforge_spec::{MeshData, RigOptions, SkeletonPreset};
//! use rigforge_spec::validation::validate_inputs;
//! use rigforge_spec::hash::canonical_input_hash;
//!
//! let skeleton = SkeletonPreset::BipedV1.source_skeleton();
//! let meshes = vec![MeshData::box_shell("body", [0.0, 0.0, 0.9], [0.4, 0.25, 0.9])];
//! let options = RigOptions::default();
//!
//! let result = validate_inputs(&skeleton, &meshes, &options);
//! assert!(result.is_ok());
//!
//! let fingerprint = canonical_input_hash(&skeleton, &meshes, &options).unwrap();
//! assert_eq!(fingerprint.len(), 64);
//! ```
//!
//! # Modules
//!
//! - [`error`]: Error and warning types, the backend error trait
//! - [`skeleton`]: Source skeleton types and the biped preset
//! - [`mesh`]: Triangle mesh input for surface probing
//! - [`options`]: Generator options
//! - [`validation`]: The precondition ladder
//! - [`hash`]: Canonical hashing

pub mod error;
pub mod hash;
pub mod mesh;
pub mod options;
pub mod skeleton;
pub mod validation;

// Re-export commonly used types at the crate root
pub use error::{
    BackendError, ErrorCode, SpecError, SynthesisError, ValidationError, ValidationResult,
    ValidationWarning, WarningCode,
};
pub use mesh::{merge_world_triangles, MeshData};
pub use options::{FaceTier, RigOptions};
pub use skeleton::{RigStamp, Side, SkeletonPreset, SourceBone, SourceSkeleton};
pub use validation::validate_inputs;
