use std::io::Write;

use proptest::prelude::*;
use serde_json::Value;
use tempfile::NamedTempFile;

use yieldcast::api::handle_json;
use yieldcast::common::error::Violation;
use yieldcast::{
    AppCfg, ErrorCode, FsModelRepo, InferenceError, InferenceService, RawInput, CROP_YIELD,
};

/// Rainfall above 1200 mm and Maha season push the yield up.
fn artifact() -> NamedTempFile {
    let names = serde_json::to_string(&CROP_YIELD.names().collect::<Vec<_>>()).unwrap();
    let body = format!(
        r#"{{
            "model_id": "sl-yield-gbr",
            "model_version": "1.0.0",
            "feature_names": {names},
            "base_score": 3.0,
            "learning_rate": 0.5,
            "trees": [
                {{ "nodes": [
                    {{ "kind": "numeric", "feature": 9, "threshold": 1200.0, "left": 1, "right": 2 }},
                    {{ "kind": "leaf", "value": -1.0 }},
                    {{ "kind": "categorical", "feature": 1, "categories": ["Maha"], "left": 3, "right": 4 }},
                    {{ "kind": "leaf", "value": 2.0 }},
                    {{ "kind": "leaf", "value": 1.0 }}
                ] }},
                {{ "nodes": [ {{ "kind": "leaf", "value": 0.4 }} ] }}
            ]
        }}"#
    );
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

fn service(file: &NamedTempFile) -> InferenceService {
    let cfg = AppCfg {
        model_path: file.path().to_path_buf(),
        ..AppCfg::default()
    };
    InferenceService::from_config(&cfg)
}

fn kandy() -> RawInput {
    RawInput::new()
        .with("Year", 2024)
        .with("Season", "Maha")
        .with("Province", "Central")
        .with("District", "Kandy")
        .with("Crop", "Paddy")
        .with("Soil_Type", "Loamy")
        .with("Irrigation", "Irrigated")
        .with("Area_Sown_ha", 100.0)
        .with("Area_Harvested_ha", 95.0)
        .with("Rainfall_mm", 1500.0)
        .with("Temperature_C", 28.0)
        .with("Fertilizer_kg_per_ha", 220.0)
}

#[test]
fn kandy_paddy_end_to_end() {
    let file = artifact();
    let service = service(&file);
    assert!(service.is_ready());
    assert_eq!(service.model_name(), Some("sl-yield-gbr"));

    let result = service.predict(&kandy()).unwrap();
    assert!((result.predicted_yield - 4.2).abs() < 1e-9);
    assert!((result.estimated_production.unwrap() - 399.0).abs() < 1e-9);
    assert_eq!(
        result.to_string(),
        "Predicted Yield: 4.20 mt/ha; Estimated Production: 399.0 metric tons"
    );
}

#[test]
fn form_defaults_plus_district_predict() {
    let file = artifact();
    let service = service(&file);

    let mut raw = CROP_YIELD.defaults();
    assert!(matches!(
        service.predict(&raw),
        Err(InferenceError::Validation(ref err)) if err.names("District")
    ));

    raw.set("District", "Colombo");
    let result = service.predict(&raw).unwrap();
    assert!((result.predicted_yield - 4.2).abs() < 1e-9);
}

#[test]
fn json_envelope_round_trip() {
    let file = artifact();
    let service = service(&file);

    let body = serde_json::to_string(&kandy()).unwrap();
    let out: Value = serde_json::from_str(&handle_json(&service, &body)).unwrap();
    assert_eq!(out["ok"], Value::Bool(true));
    assert!((out["predictedYield"].as_f64().unwrap() - 4.2).abs() < 1e-9);

    let out: Value = serde_json::from_str(&handle_json(&service, "{\"Year\": \"soon\"}")).unwrap();
    assert_eq!(out["code"].as_u64(), Some(ErrorCode::InvalidInput as u64));
    assert_eq!(out["violations"].as_array().unwrap().len(), 12);
}

#[test]
fn missing_artifact_degrades_without_crashing() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppCfg {
        model_path: dir.path().join("best_model_tuned.json"),
        ..AppCfg::default()
    };
    let service = InferenceService::from_config(&cfg);
    assert!(!service.is_ready());

    let err = service.predict(&kandy()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ModelNotLoaded);
    assert!(err.to_string().contains("best_model_tuned.json"));
}

#[test]
fn drifted_artifact_is_refused_at_load() {
    let mut file = NamedTempFile::new().unwrap();
    let body = r#"{"model_id":"old","feature_names":["Year","Season","Yield_per_ha"],
        "base_score":0.0,"learning_rate":1.0,"trees":[{"nodes":[{"kind":"leaf","value":1.0}]}]}"#;
    file.write_all(body.as_bytes()).unwrap();

    assert!(FsModelRepo::at(file.path()).load(&CROP_YIELD).is_err());
    assert!(!service(&file).is_ready());
}

proptest! {
    #[test]
    fn production_is_yield_times_harvested_area(area in 0.0f64..1.0e6, rain in 0.0f64..5000.0) {
        let file = artifact();
        let service = service(&file);
        let mut raw = kandy();
        raw.set("Area_Harvested_ha", area);
        raw.set("Rainfall_mm", rain);

        let result = service.predict(&raw).unwrap();
        let expected = result.predicted_yield * area;
        let production = result.estimated_production.unwrap();
        prop_assert!((production - expected).abs() <= 1e-9 * expected.abs().max(1.0));

        let again = service.predict(&raw).unwrap();
        prop_assert_eq!(result.predicted_yield, again.predicted_yield);
    }

    #[test]
    fn negative_measurements_never_reach_the_model(value in -1.0e6f64..-1.0e-6) {
        let file = artifact();
        let service = service(&file);
        let mut raw = kandy();
        raw.set("Rainfall_mm", value);

        match service.predict(&raw) {
            Err(InferenceError::Validation(err)) => {
                let below = matches!(err.violation_for("Rainfall_mm"), Some(Violation::BelowMinimum { .. }));
                prop_assert!(below);
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }
}
