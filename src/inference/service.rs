//! Inference orchestration: contract check, single model call, production.

use std::time::Instant;

use tracing::{debug, warn};

use crate::common::config::AppCfg;
use crate::common::error::{
    ErrorCode, InferenceError, InferenceResult, ModelError, ValidationError,
};
use crate::contract::{schema, FeatureContract, PredictionRequest, RawInput, CROP_YIELD};
use crate::model::{FsModelRepo, ModelSlot};

use super::domain::{production, PredictionResult};

/// Stateless request handler over one shared, read-only model.
///
/// `InferenceService` is `Send + Sync`; share it by reference or `Arc` across
/// request handlers. Nothing is cached or mutated between calls.
#[derive(Debug)]
pub struct InferenceService {
    contract: FeatureContract,
    model: ModelSlot,
    production_field: Option<&'static str>,
}

impl InferenceService {
    /// Service over `contract`, computing production from harvested area.
    pub fn new(contract: FeatureContract, model: ModelSlot) -> Self {
        Self {
            contract,
            model,
            production_field: Some(schema::AREA_HARVESTED),
        }
    }

    /// Field holding the harvested area used for production; `None` disables it.
    pub fn with_production_field(self, field: Option<&'static str>) -> Self {
        Self {
            production_field: field,
            ..self
        }
    }

    /// Build the crop yield service, loading the artifact named by `cfg` once.
    pub fn from_config(cfg: &AppCfg) -> Self {
        let contract = CROP_YIELD.with_unknown_fields(cfg.unknown_fields);
        let model = FsModelRepo::new(cfg).open(&contract);
        Self::new(contract, model)
    }

    /// Contract every request is validated against.
    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    /// Whether the model loaded; `false` means every prediction fails.
    pub fn is_ready(&self) -> bool {
        self.model.is_ready()
    }

    /// Identifier of the loaded model, for health reporting.
    pub fn model_name(&self) -> Option<&str> {
        self.model.name()
    }

    /// Validate without calling the model.
    pub fn validate(&self, raw: &RawInput) -> Result<PredictionRequest, ValidationError> {
        self.contract.validate(raw)
    }

    /// Run the model once for a validated request.
    pub fn infer(&self, request: &PredictionRequest) -> InferenceResult<PredictionResult> {
        let model = self.model.artifact()?;

        if let Err(detail) = self.contract.conforms(request) {
            warn!(
                ev = "infer",
                code = ErrorCode::SchemaMismatch as u32,
                detail = %detail,
                "request built for another contract"
            );
            return Err(InferenceError::SchemaMismatch { detail });
        }

        let start = Instant::now();
        let outputs = model.predict(request).and_then(|outputs| match outputs.as_slice() {
            [y] if y.is_finite() => Ok(*y),
            [y] => Err(ModelError::NonFiniteOutput(*y)),
            other => Err(ModelError::OutputShape(other.len())),
        });
        let dur_ms = start.elapsed().as_millis() as u64;

        let predicted_yield = match outputs {
            Ok(y) => y,
            Err(err) => {
                warn!(
                    ev = "infer",
                    code = ErrorCode::PredictionFailed as u32,
                    dur_ms,
                    model = model.name(),
                    error = %err,
                    "model call failed"
                );
                return Err(InferenceError::PredictionFailed(err));
            }
        };

        let area = self.production_field.and_then(|field| request.number(field));
        let estimated_production = production(predicted_yield, area);

        debug!(
            ev = "infer",
            code = ErrorCode::Ok as u32,
            dur_ms,
            model = model.name(),
            request = %request.fingerprint(),
            predicted_yield,
            "prediction served"
        );

        Ok(PredictionResult {
            predicted_yield,
            estimated_production,
            request: request.clone(),
        })
    }

    /// Validate raw caller input and run inference on it.
    ///
    /// A degraded service reports `ModelNotLoaded` before looking at the input.
    pub fn predict(&self, raw: &RawInput) -> InferenceResult<PredictionResult> {
        self.model.artifact()?;
        let request = self.contract.validate(raw)?;
        self.infer(&request)
    }
}
