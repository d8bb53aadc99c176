//! Error taxonomy shared across the core.
//!
//! Every error maps onto a stable [`ErrorCode`] so the C ABI and the JSON
//! envelope can report failures without string matching.

use std::fmt;

use thiserror::Error;

/// Stable error codes that cross the FFI boundary.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// The model artifact failed to load at startup.
    ModelNotLoaded = 1,
    /// Caller input failed validation against the feature contract.
    InvalidInput = 2,
    /// A request built for another contract reached the service.
    SchemaMismatch = 3,
    /// The model call itself failed.
    PredictionFailed = 4,
    /// Catch-all for bugs at the embedding boundary.
    Internal = 5,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Ok => "ok",
            ErrorCode::ModelNotLoaded => "model_not_loaded",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::SchemaMismatch => "schema_mismatch",
            ErrorCode::PredictionFailed => "prediction_failed",
            ErrorCode::Internal => "internal",
        }
    }
}

/// What is wrong with a single field of a prediction request.
#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    Missing,
    Duplicate,
    Unknown,
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    NotInDomain {
        value: String,
        allowed: &'static [&'static str],
    },
    EmptyText,
    NotANumber {
        value: String,
    },
    NotAnInteger {
        value: String,
    },
    NonFinite,
    BelowMinimum {
        value: f64,
        min: f64,
    },
    AboveMaximum {
        value: f64,
        max: f64,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing => write!(f, "is required"),
            Violation::Duplicate => write!(f, "was supplied more than once"),
            Violation::Unknown => write!(f, "is not part of the feature contract"),
            Violation::WrongType { expected, found } => {
                write!(f, "expected {expected}, got {found}")
            }
            Violation::NotInDomain { value, allowed } => {
                write!(f, "'{value}' is not one of: {}", allowed.join(", "))
            }
            Violation::EmptyText => write!(f, "must not be empty"),
            Violation::NotANumber { value } => write!(f, "'{value}' is not a number"),
            Violation::NotAnInteger { value } => write!(f, "'{value}' is not a whole number"),
            Violation::NonFinite => write!(f, "must be a finite number"),
            Violation::BelowMinimum { value, min } => {
                write!(f, "{value} is below the minimum of {min}")
            }
            Violation::AboveMaximum { value, max } => {
                write!(f, "{value} is above the maximum of {max}")
            }
        }
    }
}

/// A violation attributed to the field (or unknown key) that caused it.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldViolation {
    pub field: String,
    pub violation: Violation,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.violation)
    }
}

/// Every field-level problem found in one request. Never empty.
#[derive(Clone, Debug, PartialEq, Error)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub(crate) fn new(violations: Vec<FieldViolation>) -> Self {
        debug_assert!(!violations.is_empty());
        Self { violations }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// First violation recorded against `field`, if any.
    pub fn violation_for(&self, field: &str) -> Option<&Violation> {
        self.violations
            .iter()
            .find(|v| v.field == field)
            .map(|v| &v.violation)
    }

    pub fn names(&self, field: &str) -> bool {
        self.violation_for(field).is_some()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid prediction request: ")?;
        for (idx, violation) in self.violations.iter().enumerate() {
            if idx > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Failures raised while loading or evaluating a model artifact.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("model JSON parse error: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("artifact features do not match the contract: {0}")]
    FeatureMismatch(String),
    #[error("invalid tree {tree}: {reason}")]
    InvalidTree { tree: usize, reason: String },
    #[error("non-finite {name}: {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("cannot evaluate feature {feature}: {reason}")]
    Evaluation { feature: String, reason: String },
    #[error("expected exactly one output, got {0}")]
    OutputShape(usize),
    #[error("model returned a non-finite yield: {0}")]
    NonFiniteOutput(f64),
    #[error("model lock poisoned by an earlier panic")]
    Poisoned,
    /// Opaque failure reported by an external artifact implementation.
    #[error("{0}")]
    Backend(String),
}

/// Errors returned by the inference service.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model not loaded: {reason}")]
    ModelNotLoaded { reason: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("request does not match the feature contract: {detail}")]
    SchemaMismatch { detail: String },
    #[error("prediction failed: {0}")]
    PredictionFailed(#[from] ModelError),
}

impl InferenceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            InferenceError::ModelNotLoaded { .. } => ErrorCode::ModelNotLoaded,
            InferenceError::Validation(_) => ErrorCode::InvalidInput,
            InferenceError::SchemaMismatch { .. } => ErrorCode::SchemaMismatch,
            InferenceError::PredictionFailed(_) => ErrorCode::PredictionFailed,
        }
    }
}

/// Result alias used by the inference path.
pub type InferenceResult<T> = Result<T, InferenceError>;
