// lib.rs - feature contract and inference service for crop yield prediction
pub mod common;
pub mod contract;
pub mod model;
pub mod inference;
pub mod api;

pub use common::{AppCfg, ErrorCode, InferenceError, InferenceResult, ValidationError};
pub use contract::{FeatureContract, PredictionRequest, RawInput, CROP_YIELD};
pub use inference::{InferenceService, PredictionResult};
pub use model::{FsModelRepo, GradientBoostedTrees, ModelArtifact, ModelSlot};
