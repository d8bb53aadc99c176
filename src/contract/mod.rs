//! Feature contract: the exact named, typed, ordered inputs of the yield model.

pub mod domain;
pub mod schema;
pub mod service;

pub use domain::{
    FieldDomain, FieldKind, FieldSpec, FieldValue, Prefill, PredictionRequest, RawInput,
    RawValue, UnknownFieldPolicy,
};
pub use schema::CROP_YIELD;
pub use service::FeatureContract;
