//! Error types for biped rig synthesis.

use rigforge_spec::error::BackendError;
use rigforge_spec::{SpecError, ValidationResult};
use thiserror::Error;

/// Result type for rig synthesis operations.
pub type RigResult<T> = Result<T, RigError>;

/// Errors that can occur during rig synthesis.
#[derive(Debug, Error)]
pub enum RigError {
    /// Input preconditions were not met; synthesis did not start.
    #[error("preconditions not met ({} problem(s)): {}", reasons.len(), reasons.join("; "))]
    PreconditionFailed {
        /// Formatted validation errors, in check order.
        reasons: Vec<String>,
    },

    /// A referenced joint does not exist in the graph.
    #[error("unknown joint '{name}'")]
    UnknownJoint {
        /// The missing joint name.
        name: String,
    },

    /// A joint with this name already exists.
    #[error("duplicate joint name '{name}'")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// Geometry required by a computation collapsed to zero.
    #[error("degenerate geometry: {what}")]
    DegenerateGeometry {
        /// What collapsed.
        what: String,
    },

    /// Reparenting would create a parent cycle.
    #[error("parenting '{child}' under '{parent}' would create a cycle")]
    ParentCycle {
        /// The child joint.
        child: String,
        /// The requested parent.
        parent: String,
    },

    /// A joint scheduled for removal still has children.
    #[error("cannot remove joint '{name}': it still has children")]
    JointHasChildren {
        /// The joint name.
        name: String,
    },

    /// A module's declared joint dependencies never became available.
    #[error("module '{module}' depends on missing joints: {missing:?}")]
    DependencyUnsatisfied {
        /// The blocked module.
        module: String,
        /// The joint names that never appeared.
        missing: Vec<String>,
    },

    /// A module builder failed; carries the failing module's name.
    #[error("module '{module}' failed: {source}")]
    ModuleFailed {
        /// The module that was building.
        module: String,
        /// The underlying error.
        #[source]
        source: Box<RigError>,
    },

    /// A driver referenced a constraint that is not on the joint.
    #[error("joint '{joint}' has no constraint named '{constraint}'")]
    UnknownConstraint {
        /// The joint that was searched.
        joint: String,
        /// The missing constraint name.
        constraint: String,
    },

    /// A driver expression could not be parsed or evaluated.
    #[error("driver expression error: {0}")]
    Expression(String),

    /// Canonicalization or hashing of a document failed.
    #[error("hashing failed: {0}")]
    Hash(#[from] SpecError),
}

impl RigError {
    /// Builds a precondition error from a failed validation result.
    pub fn preconditions(result: &ValidationResult) -> Self {
        RigError::PreconditionFailed {
            reasons: result.errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// An unknown-joint error.
    pub fn unknown_joint(name: impl Into<String>) -> Self {
        RigError::UnknownJoint { name: name.into() }
    }

    /// A duplicate-name error.
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        RigError::DuplicateName { name: name.into() }
    }

    /// A degenerate-geometry error.
    pub fn degenerate(what: impl Into<String>) -> Self {
        RigError::DegenerateGeometry { what: what.into() }
    }

    /// An unknown-constraint error.
    pub fn unknown_constraint(joint: impl Into<String>, constraint: impl Into<String>) -> Self {
        RigError::UnknownConstraint {
            joint: joint.into(),
            constraint: constraint.into(),
        }
    }

    /// Wraps an error with the module it occurred in. Already-wrapped
    /// errors keep their original module.
    pub fn in_module(self, module: &str) -> Self {
        match self {
            RigError::ModuleFailed { .. } => self,
            other => RigError::ModuleFailed {
                module: module.to_string(),
                source: Box::new(other),
            },
        }
    }
}

impl BackendError for RigError {
    fn code(&self) -> &'static str {
        match self {
            RigError::PreconditionFailed { .. } => "RIG_001",
            RigError::UnknownJoint { .. } => "RIG_002",
            RigError::DuplicateName { .. } => "RIG_003",
            RigError::DegenerateGeometry { .. } => "RIG_004",
            RigError::ParentCycle { .. } => "RIG_005",
            RigError::JointHasChildren { .. } => "RIG_006",
            RigError::DependencyUnsatisfied { .. } => "RIG_007",
            RigError::ModuleFailed { .. } => "RIG_008",
            RigError::Expression(_) => "RIG_009",
            RigError::Hash(_) => "RIG_010",
            RigError::UnknownConstraint { .. } => "RIG_011",
        }
    }

    fn category(&self) -> &'static str {
        "biped"
    }
}
