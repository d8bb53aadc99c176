//! JSON envelope shared by every presentation adapter.
//!
//! Requests are a flat object of field name to raw value. Responses are either
//! `{"ok":true,"predictedYield":..,"estimatedProduction":..}` or an error
//! payload carrying a stable numeric code and every field violation.

use serde::Serialize;

use crate::common::error::{ErrorCode, InferenceError};
use crate::contract::{FeatureContract, FieldDomain, FieldKind, Prefill, RawInput};
use crate::inference::{InferenceService, PredictionResult};

/// Returned when serialization itself fails.
pub const FALLBACK_JSON: &str = r#"{"ok":false,"code":5,"error":"internal","message":"response serialization failed","violations":[]}"#;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub ok: bool,
    pub predicted_yield: f64,
    pub estimated_production: Option<f64>,
}

impl From<&PredictionResult> for PredictionResponse {
    fn from(result: &PredictionResult) -> Self {
        Self {
            ok: true,
            predicted_yield: result.predicted_yield,
            estimated_production: result.estimated_production,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ViolationDto {
    pub field: String,
    pub problem: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub ok: bool,
    pub code: u32,
    pub error: &'static str,
    pub message: String,
    pub violations: Vec<ViolationDto>,
}

impl ErrorPayload {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code as u32,
            error: code.as_str(),
            message: message.into(),
            violations: Vec::new(),
        }
    }
}

impl From<&InferenceError> for ErrorPayload {
    fn from(err: &InferenceError) -> Self {
        let mut payload = ErrorPayload::new(err.code(), err.to_string());
        if let InferenceError::Validation(validation) = err {
            payload.violations = validation
                .violations()
                .iter()
                .map(|v| ViolationDto {
                    field: v.field.clone(),
                    problem: v.violation.to_string(),
                })
                .collect();
        }
        payload
    }
}

/// Field description for UI form generation.
#[derive(Debug, Serialize)]
pub struct FieldDto {
    pub name: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<&'static [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| FALLBACK_JSON.to_string())
}

/// Parse a JSON request body, run a prediction and render the response.
pub fn handle_json(service: &InferenceService, body: &str) -> String {
    let raw: RawInput = match serde_json::from_str(body) {
        Ok(raw) => raw,
        Err(err) => {
            return to_json(&ErrorPayload::new(
                ErrorCode::InvalidInput,
                format!("request body is not a JSON object of fields: {err}"),
            ))
        }
    };

    match service.predict(&raw) {
        Ok(result) => to_json(&PredictionResponse::from(&result)),
        Err(err) => to_json(&ErrorPayload::from(&err)),
    }
}

/// Describe the contract's fields, kinds, domains and prefills.
pub fn contract_json(contract: &FeatureContract) -> String {
    let fields: Vec<FieldDto> = contract
        .fields()
        .iter()
        .map(|spec| {
            let (allowed, min, max) = match spec.domain {
                FieldDomain::OneOf(values) => (Some(values), None, None),
                FieldDomain::NonEmpty => (None, None, None),
                FieldDomain::IntRange { min, max } => (None, Some(min as f64), Some(max as f64)),
                FieldDomain::Range { min, max } => (None, Some(min), max),
            };
            let default = spec.prefill.map(|prefill| match prefill {
                Prefill::Text(v) => serde_json::Value::from(v),
                Prefill::Integer(v) => serde_json::Value::from(v),
                Prefill::Number(v) => serde_json::Value::from(v),
            });
            FieldDto {
                name: spec.name,
                kind: spec.kind,
                allowed,
                min,
                max,
                default,
            }
        })
        .collect();
    to_json(&serde_json::json!({ "fields": fields }))
}
