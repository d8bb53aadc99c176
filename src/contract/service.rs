//! The validation boundary between loosely typed callers and the model.

use tracing::{debug, warn};

use crate::common::error::{FieldViolation, ValidationError, Violation};

use super::domain::{
    FieldDomain, FieldKind, FieldSpec, FieldValue, PredictionRequest, RawInput, RawValue,
    UnknownFieldPolicy,
};

/// Ordered, immutable set of fields a model was trained on.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FeatureContract {
    fields: &'static [FieldSpec],
    unknown_fields: UnknownFieldPolicy,
}

impl FeatureContract {
    /// Contract over `fields` in trained order, rejecting unknown fields.
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self {
            fields,
            unknown_fields: UnknownFieldPolicy::Reject,
        }
    }

    /// Same fields with a different unknown-field policy.
    pub const fn with_unknown_fields(self, policy: UnknownFieldPolicy) -> Self {
        Self {
            unknown_fields: policy,
            ..self
        }
    }

    /// Field specs in trained order.
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Spec for `name`, if the contract has it.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Trained column index of `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field names in trained order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|f| f.name)
    }

    pub fn unknown_fields(&self) -> UnknownFieldPolicy {
        self.unknown_fields
    }

    /// Form prefill values for UIs. Fields without a prefill are omitted.
    pub fn defaults(&self) -> RawInput {
        self.fields
            .iter()
            .filter_map(|f| f.prefill.map(|p| (f.name, RawValue::from(p))))
            .collect()
    }

    /// Coerce and check every field of `raw`, reporting all violations at once.
    pub fn validate(&self, raw: &RawInput) -> Result<PredictionRequest, ValidationError> {
        let mut slots: Vec<Vec<&RawValue>> = vec![Vec::new(); self.fields.len()];
        let mut unknown: Vec<&str> = Vec::new();

        for (key, value) in raw.iter() {
            match self.position(key) {
                Some(idx) => slots[idx].push(value),
                None if !unknown.contains(&key) => unknown.push(key),
                None => {}
            }
        }

        let mut violations = Vec::new();
        let mut values = Vec::with_capacity(self.fields.len());

        for (spec, supplied) in self.fields.iter().zip(&slots) {
            let outcome = match supplied.as_slice() {
                [] | [RawValue::Null] => Err(Violation::Missing),
                [value] => coerce(spec, value),
                _ => Err(Violation::Duplicate),
            };
            match outcome {
                Ok(value) => values.push((spec.name, value)),
                Err(violation) => violations.push(FieldViolation {
                    field: spec.name.to_string(),
                    violation,
                }),
            }
        }

        match self.unknown_fields {
            UnknownFieldPolicy::Reject => {
                violations.extend(unknown.iter().map(|key| FieldViolation {
                    field: key.to_string(),
                    violation: Violation::Unknown,
                }));
            }
            UnknownFieldPolicy::Ignore => {
                for key in &unknown {
                    warn!(ev = "unknown_field_ignored", field = %key, "ignoring field outside the contract");
                }
            }
        }

        if violations.is_empty() {
            Ok(PredictionRequest::from_validated(values))
        } else {
            debug!(ev = "validate", violations = violations.len(), "request rejected");
            Err(ValidationError::new(violations))
        }
    }

    /// Check that a request carries exactly this contract's fields, in order,
    /// with values inside each field's domain.
    pub fn conforms(&self, request: &PredictionRequest) -> Result<(), String> {
        if request.len() != self.fields.len() {
            return Err(format!(
                "expected {} fields, found {}",
                self.fields.len(),
                request.len()
            ));
        }
        for (idx, (spec, (name, value))) in self.fields.iter().zip(request.iter()).enumerate() {
            if spec.name != name {
                return Err(format!(
                    "position {idx}: expected field {}, found {name}",
                    spec.name
                ));
            }
            if !spec.admits(value) {
                return Err(format!(
                    "{name}: {} value '{value}' is outside the {} domain",
                    value.kind().as_str(),
                    spec.kind.as_str()
                ));
            }
        }
        Ok(())
    }
}

fn coerce(spec: &FieldSpec, raw: &RawValue) -> Result<FieldValue, Violation> {
    match (spec.kind, spec.domain) {
        (FieldKind::Categorical, FieldDomain::OneOf(allowed)) => {
            let text = expect_text(raw)?;
            if allowed.contains(&text) {
                Ok(FieldValue::Category(text.to_string()))
            } else {
                Err(Violation::NotInDomain {
                    value: text.to_string(),
                    allowed,
                })
            }
        }
        (FieldKind::Text, _) => {
            let text = expect_text(raw)?.trim();
            if text.is_empty() {
                Err(Violation::EmptyText)
            } else {
                Ok(FieldValue::Text(text.to_string()))
            }
        }
        (FieldKind::Integer, FieldDomain::IntRange { min, max }) => {
            let value = coerce_integer(raw)?;
            if value < min {
                Err(Violation::BelowMinimum {
                    value: value as f64,
                    min: min as f64,
                })
            } else if value > max {
                Err(Violation::AboveMaximum {
                    value: value as f64,
                    max: max as f64,
                })
            } else {
                Ok(FieldValue::Integer(value))
            }
        }
        (FieldKind::Continuous, FieldDomain::Range { min, max }) => {
            let value = coerce_number(raw)?;
            if value < min {
                Err(Violation::BelowMinimum { value, min })
            } else if let Some(max) = max.filter(|max| value > *max) {
                Err(Violation::AboveMaximum { value, max })
            } else {
                Ok(FieldValue::Continuous(value))
            }
        }
        // Kind and domain disagree: the contract itself is malformed, so no
        // caller value can satisfy it.
        (kind, _) => Err(Violation::WrongType {
            expected: kind.as_str(),
            found: raw.type_name(),
        }),
    }
}

fn expect_text(raw: &RawValue) -> Result<&str, Violation> {
    match raw {
        RawValue::Text(text) => Ok(text),
        other => Err(Violation::WrongType {
            expected: "text",
            found: other.type_name(),
        }),
    }
}

fn coerce_number(raw: &RawValue) -> Result<f64, Violation> {
    let value = match raw {
        RawValue::Integer(v) => *v as f64,
        RawValue::Number(v) => *v,
        RawValue::Text(text) => text.trim().parse::<f64>().map_err(|_| Violation::NotANumber {
            value: text.clone(),
        })?,
        other => {
            return Err(Violation::WrongType {
                expected: "number",
                found: other.type_name(),
            })
        }
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Violation::NonFinite)
    }
}

fn coerce_integer(raw: &RawValue) -> Result<i64, Violation> {
    match raw {
        RawValue::Integer(v) => Ok(*v),
        RawValue::Text(text) => {
            if let Ok(v) = text.trim().parse::<i64>() {
                return Ok(v);
            }
            let parsed = coerce_number(raw)?;
            integral(parsed).ok_or_else(|| Violation::NotAnInteger {
                value: text.clone(),
            })
        }
        RawValue::Number(v) => {
            let parsed = coerce_number(raw)?;
            integral(parsed).ok_or_else(|| Violation::NotAnInteger {
                value: v.to_string(),
            })
        }
        other => Err(Violation::WrongType {
            expected: "integer",
            found: other.type_name(),
        }),
    }
}

fn integral(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then_some(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::schema::{self, CROP_YIELD};

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
    fn valid_request_keeps_contract_order() {
        let mut shuffled: RawInput = kandy().iter().map(|(k, v)| (k, v.clone())).collect();
        shuffled.remove("Year");
        shuffled.push("Year", 2024);

        let request = CROP_YIELD.validate(&shuffled).unwrap();
        let names: Vec<_> = request.names().collect();
        let expected: Vec<_> = CROP_YIELD.names().collect();
        assert_eq!(names, expected);
        assert_eq!(request.get("Year"), Some(&FieldValue::Integer(2024)));
        assert_eq!(request.number("Area_Harvested_ha"), Some(95.0));
        assert!(CROP_YIELD.conforms(&request).is_ok());
    }

    #[test]
    fn missing_field_is_named() {
        let mut raw = kandy();
        raw.remove("Crop");
        let err = CROP_YIELD.validate(&raw).unwrap_err();
        assert_eq!(err.violation_for("Crop"), Some(&Violation::Missing));
        assert_eq!(err.violations().len(), 1);
    }

    #[test]
    fn null_counts_as_missing() {
        let raw = kandy().with("District", RawValue::Null);
        let err = CROP_YIELD.validate(&raw).unwrap_err();
        assert_eq!(err.violation_for("District"), Some(&Violation::Missing));
    }

    #[test]
    fn out_of_domain_category_is_rejected() {
        let err = CROP_YIELD.validate(&kandy().with("Season", "Winter")).unwrap_err();
        assert!(matches!(
            err.violation_for("Season"),
            Some(Violation::NotInDomain { value, .. }) if value == "Winter"
        ));
    }

    #[test]
    fn categories_are_case_sensitive() {
        let err = CROP_YIELD.validate(&kandy().with("Crop", "paddy")).unwrap_err();
        assert!(err.names("Crop"));
    }

    #[test]
    fn negative_measurement_is_rejected() {
        let err = CROP_YIELD.validate(&kandy().with("Rainfall_mm", -5.0)).unwrap_err();
        assert_eq!(
            err.violation_for("Rainfall_mm"),
            Some(&Violation::BelowMinimum {
                value: -5.0,
                min: 0.0
            })
        );
    }

    #[test]
    fn every_violation_is_reported() {
        let raw = kandy()
            .with("Season", "Winter")
            .with("Rainfall_mm", -5.0)
            .with("Year", 2035)
            .with("District", "   ")
            .with("Rainfall_per_area", 15.8);
        let err = CROP_YIELD.validate(&raw).unwrap_err();

        let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            ["Year", "Season", "District", "Rainfall_mm", "Rainfall_per_area"]
        );
        assert_eq!(err.violation_for("District"), Some(&Violation::EmptyText));
        assert_eq!(
            err.violation_for("Rainfall_per_area"),
            Some(&Violation::Unknown)
        );
    }

    #[test]
    fn unknown_fields_can_be_ignored() {
        let contract = CROP_YIELD.with_unknown_fields(UnknownFieldPolicy::Ignore);
        let raw = kandy().with("Market_Price_LKR_per_kg", 120.0);
        let request = contract.validate(&raw).unwrap();
        assert_eq!(request.len(), 12);
        assert!(request.get("Market_Price_LKR_per_kg").is_none());

        assert!(CROP_YIELD.validate(&raw).unwrap_err().names("Market_Price_LKR_per_kg"));
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let mut raw = kandy();
        raw.push("Season", "Yala");
        let err = CROP_YIELD.validate(&raw).unwrap_err();
        assert_eq!(err.violation_for("Season"), Some(&Violation::Duplicate));
    }

    #[test]
    fn numeric_text_is_coerced() {
        let raw = kandy()
            .with("Year", "2023")
            .with("Rainfall_mm", " 1320.5 ")
            .with("Area_Sown_ha", 80);
        let request = CROP_YIELD.validate(&raw).unwrap();
        assert_eq!(request.get("Year"), Some(&FieldValue::Integer(2023)));
        assert_eq!(request.number("Rainfall_mm"), Some(1320.5));
        assert_eq!(request.get("Area_Sown_ha"), Some(&FieldValue::Continuous(80.0)));
    }

    #[test]
    fn integral_floats_are_integers_fractions_are_not() {
        let ok = CROP_YIELD.validate(&kandy().with("Year", 2022.0)).unwrap();
        assert_eq!(ok.get("Year"), Some(&FieldValue::Integer(2022)));

        let err = CROP_YIELD.validate(&kandy().with("Year", 2022.5)).unwrap_err();
        assert!(matches!(err.violation_for("Year"), Some(Violation::NotAnInteger { .. })));
    }

    #[test]
    fn wrong_types_and_garbage_are_rejected() {
        let raw = kandy()
            .with("Temperature_C", "warm")
            .with("Irrigation", true)
            .with("Fertilizer_kg_per_ha", f64::INFINITY);
        let err = CROP_YIELD.validate(&raw).unwrap_err();
        assert!(matches!(
            err.violation_for("Temperature_C"),
            Some(Violation::NotANumber { .. })
        ));
        assert_eq!(
            err.violation_for("Irrigation"),
            Some(&Violation::WrongType {
                expected: "text",
                found: "boolean"
            })
        );
        assert_eq!(
            err.violation_for("Fertilizer_kg_per_ha"),
            Some(&Violation::NonFinite)
        );
    }

    #[test]
    fn district_is_trimmed() {
        let request = CROP_YIELD.validate(&kandy().with("District", "  Kandy ")).unwrap();
        assert_eq!(request.get("District"), Some(&FieldValue::Text("Kandy".into())));
    }

    #[test]
    fn defaults_cover_everything_but_district() {
        let defaults = CROP_YIELD.defaults();
        assert_eq!(defaults.len(), 11);
        assert!(defaults.get(schema::DISTRICT).is_none());

        let err = CROP_YIELD.validate(&defaults).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violation_for(schema::DISTRICT), Some(&Violation::Missing));

        let filled = defaults.with(schema::DISTRICT, "Galle");
        assert!(CROP_YIELD.validate(&filled).is_ok());
    }

    #[test]
    fn conforms_rejects_foreign_records() {
        const SHORT: &[FieldSpec] = &[FieldSpec::integer("Year", 2010, 2030)];
        let other = FeatureContract::new(SHORT);
        let request = other.validate(&RawInput::new().with("Year", 2020)).unwrap();

        let err = CROP_YIELD.conforms(&request).unwrap_err();
        assert!(err.contains("expected 12 fields"));
    }
}
