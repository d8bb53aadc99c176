//! Shared utilities that glue the contract, model and inference layers together.
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod log;

pub use config::AppCfg;
pub use error::{
    ErrorCode, FieldViolation, InferenceError, InferenceResult, ModelError, ValidationError,
    Violation,
};
