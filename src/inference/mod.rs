//! Inference: one validated record in, one yield and production estimate out.

pub mod domain;
pub mod service;

pub use domain::{production, PredictionResult};
pub use service::InferenceService;
