//! Error and warning types for input validation and rig synthesis.

use thiserror::Error;

/// Error codes for input validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Skeleton contract errors (E001-E009)
    /// E001: Skeleton carries no rig stamp
    MissingStamp,
    /// E002: Invalid skeleton or bone name format
    InvalidName,
    /// E003: Referenced parent bone does not exist
    UnknownParent,
    /// E004: Duplicate bone name in the skeleton
    DuplicateBone,
    /// E005: Required bone missing for the enabled options
    MissingBone,
    /// E006: Bone has zero length
    ZeroLengthBone,
    /// E007: Parent chain contains a cycle
    ParentCycle,

    // Mesh errors (E010-E013)
    /// E010: No meshes supplied
    NoMeshes,
    /// E011: Mesh index out of range for its position buffer
    IndexOutOfRange,
    /// E012: Mesh index count is not a multiple of three
    RaggedTriangles,
    /// E013: Mesh has a non-finite vertex or transform
    NonFiniteMesh,

    // Options errors (E020-E023)
    /// E020: Object scale is not identity
    NonIdentityScale,
    /// E021: Twist count outside the supported range
    TwistCountOutOfRange,
    /// E022: Option value outside its valid range
    OptionOutOfRange,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::MissingStamp => "E001",
            ErrorCode::InvalidName => "E002",
            ErrorCode::UnknownParent => "E003",
            ErrorCode::DuplicateBone => "E004",
            ErrorCode::MissingBone => "E005",
            ErrorCode::ZeroLengthBone => "E006",
            ErrorCode::ParentCycle => "E007",
            ErrorCode::NoMeshes => "E010",
            ErrorCode::IndexOutOfRange => "E011",
            ErrorCode::RaggedTriangles => "E012",
            ErrorCode::NonFiniteMesh => "E013",
            ErrorCode::NonIdentityScale => "E020",
            ErrorCode::TwistCountOutOfRange => "E021",
            ErrorCode::OptionOutOfRange => "E022",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for input validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: Skeleton already stamped as a generated rig
    AlreadyGenerated,
    /// W002: Optional bone group absent, dependent feature disabled
    OptionalBonesAbsent,
    /// W003: Mesh triangle count unusually low for surface probing
    SparseMesh,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::AlreadyGenerated => "W001",
            WarningCode::OptionalBonesAbsent => "W002",
            WarningCode::SparseMesh => "W003",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Path to the problematic field (e.g., "bones\[3\].parent").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with an input path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and optional input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// Path to the problematic field.
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning.
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation warning with an input path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Top-level error type for input contract operations.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Input validation failed with one or more errors.
    #[error("input validation failed with {0} error(s)")]
    ValidationFailed(usize),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Canonicalization error.
    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of input validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether validation passed (no errors).
    pub ok: bool,
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of validation warnings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Creates a failed validation result.
    pub fn failure(errors: Vec<ValidationError>) -> Self {
        Self {
            ok: false,
            errors,
            warnings: Vec::new(),
        }
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.ok = false;
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Converts to a Result, returning Err if there are errors.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, Vec<ValidationError>> {
        if self.ok {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}

/// Common trait for synthesis backend errors.
///
/// Each backend error type implements this trait to enable:
/// - Consistent error codes for reporting
/// - Human-readable messages for users
/// - Integration with the unified `SynthesisError` type
pub trait BackendError: std::error::Error {
    /// Get the error code for reporting.
    ///
    /// Returns a static string like "RIG_001". These codes are stable and
    /// can be used for programmatic error handling.
    fn code(&self) -> &'static str;

    /// Get a human-readable message describing the error.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Get the error category for grouping related errors.
    fn category(&self) -> &'static str;
}

/// A unified error type that can wrap any backend error.
///
/// Lets callers handle errors from different rig backends uniformly without
/// this crate depending on backend crates.
#[derive(Debug)]
pub struct SynthesisError {
    /// The error code (e.g., "RIG_001").
    pub code: &'static str,
    /// The human-readable error message.
    pub message: String,
    /// The error category (e.g., "biped").
    pub category: &'static str,
    /// The underlying error, boxed for type erasure.
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SynthesisError {
    /// Create a `SynthesisError` from any `BackendError` implementor.
    pub fn from_backend<E: BackendError + Send + Sync + 'static>(err: E) -> Self {
        Self {
            code: err.code(),
            message: err.message(),
            category: err.category(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a `SynthesisError` with explicit values.
    pub fn new(code: &'static str, message: impl Into<String>, category: &'static str) -> Self {
        Self {
            code,
            message: message.into(),
            category,
            source: None,
        }
    }
}

impl std::fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for SynthesisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
