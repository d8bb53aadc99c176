//! Types describing the feature contract and the values that flow through it.
//!
//! Raw caller input ([`RawInput`]) is deliberately loose: UI widgets hand over
//! numbers as text, integers as floats and sometimes nothing at all. Validated
//! input ([`PredictionRequest`]) is strict and can only be produced by
//! [`FeatureContract::validate`](super::FeatureContract::validate).

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::common::fingerprint::Fingerprint;

/// Value kind of a contract field.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Categorical,
    Text,
    Integer,
    Continuous,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Categorical => "categorical",
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Continuous => "continuous",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Continuous)
    }
}

/// Admissible values of a contract field. Bounds are inclusive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FieldDomain {
    /// Closed set, matched case-sensitively.
    OneOf(&'static [&'static str]),
    /// Any text that is non-empty after trimming.
    NonEmpty,
    IntRange { min: i64, max: i64 },
    Range { min: f64, max: Option<f64> },
}

/// UI prefill for a field. Never used to fill in missing input.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Prefill {
    Text(&'static str),
    Integer(i64),
    Number(f64),
}

/// One `(name, kind, domain)` entry of the contract.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub domain: FieldDomain,
    pub prefill: Option<Prefill>,
}

impl FieldSpec {
    /// Field whose value must be one of `values`, matched case-sensitively.
    pub const fn categorical(name: &'static str, values: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: FieldKind::Categorical,
            domain: FieldDomain::OneOf(values),
            prefill: None,
        }
    }

    /// Free-text field that must not be empty after trimming.
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            domain: FieldDomain::NonEmpty,
            prefill: None,
        }
    }

    /// Whole-number field within `min..=max`.
    pub const fn integer(name: &'static str, min: i64, max: i64) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
            domain: FieldDomain::IntRange { min, max },
            prefill: None,
        }
    }

    /// Continuous measurement that must be finite and at least zero.
    pub const fn non_negative(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Continuous,
            domain: FieldDomain::Range { min: 0.0, max: None },
            prefill: None,
        }
    }

    /// Attach the value a form shows before the user edits it.
    pub const fn with_prefill(self, prefill: Prefill) -> Self {
        Self {
            prefill: Some(prefill),
            ..self
        }
    }

    /// Whether an already typed value lies inside this field's kind and domain.
    pub fn admits(&self, value: &FieldValue) -> bool {
        if value.kind() != self.kind {
            return false;
        }
        match (self.domain, value) {
            (FieldDomain::OneOf(allowed), FieldValue::Category(v)) => allowed.contains(&v.as_str()),
            (FieldDomain::NonEmpty, FieldValue::Text(v)) => !v.trim().is_empty(),
            (FieldDomain::IntRange { min, max }, FieldValue::Integer(v)) => (min..=max).contains(v),
            (FieldDomain::Range { min, max }, FieldValue::Continuous(v)) => {
                v.is_finite() && *v >= min && max.map_or(true, |max| *v <= max)
            }
            _ => false,
        }
    }
}

/// Behaviour for input keys the contract does not know.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    #[default]
    Reject,
    /// Drop the key and log a warning.
    Ignore,
}

impl FromStr for UnknownFieldPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(UnknownFieldPolicy::Reject),
            "ignore" => Ok(UnknownFieldPolicy::Ignore),
            other => Err(format!("unknown field policy '{other}'")),
        }
    }
}

/// Loosely typed value as handed over by a form widget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    /// Arrays and objects. Never valid, but kept so the field gets its own
    /// violation instead of failing the whole body.
    Other(serde_json::Value),
}

impl RawValue {
    /// JSON-ish name of the value's shape, used in `WrongType` violations.
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "boolean",
            RawValue::Integer(_) => "integer",
            RawValue::Number(_) => "number",
            RawValue::Text(_) => "text",
            RawValue::Other(serde_json::Value::Array(_)) => "array",
            RawValue::Other(serde_json::Value::Object(_)) => "object",
            RawValue::Other(_) => "value",
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Integer(i64::from(value))
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<Prefill> for RawValue {
    fn from(value: Prefill) -> Self {
        match value {
            Prefill::Text(v) => RawValue::Text(v.to_string()),
            Prefill::Integer(v) => RawValue::Integer(v),
            Prefill::Number(v) => RawValue::Number(v),
        }
    }
}

/// Field map supplied by a caller. Keeps insertion order and duplicate keys so
/// validation can report them instead of silently keeping one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawInput {
    entries: Vec<(String, RawValue)>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`RawInput::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Replace the first entry for `key`, or append one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Append an entry even if the key is already present.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Remove every entry for `key`.
    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawInput
where
    K: Into<String>,
    V: Into<RawValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut input = RawInput::new();
        for (k, v) in iter {
            input.push(k, v);
        }
        input
    }
}

impl Serialize for RawInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawInputVisitor;

        impl<'de> Visitor<'de> for RawInputVisitor {
            type Value = RawInput;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping field names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawInput, A::Error> {
                let mut input = RawInput::new();
                while let Some((key, value)) = access.next_entry::<String, RawValue>()? {
                    input.push(key, value);
                }
                Ok(input)
            }
        }

        deserializer.deserialize_map(RawInputVisitor)
    }
}

/// A value that passed validation for its field.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Category(String),
    Text(String),
    Integer(i64),
    Continuous(f64),
}

impl FieldValue {
    /// Kind this value was coerced to.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Category(_) => FieldKind::Categorical,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Continuous(_) => FieldKind::Continuous,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Continuous(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Category(v) | FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Category(v) | FieldValue::Text(v) => f.write_str(v),
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Continuous(v) => write!(f, "{v}"),
        }
    }
}

/// Validated feature record: one value per contract field, in contract order.
///
/// This is the record handed to the model. There is no public constructor;
/// obtain one from [`FeatureContract::validate`](super::FeatureContract::validate).
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionRequest {
    fields: Vec<(&'static str, FieldValue)>,
}

impl PredictionRequest {
    pub(crate) fn from_validated(fields: Vec<(&'static str, FieldValue)>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
    }

    /// Positional access, matching the trained column order.
    pub fn value_at(&self, index: usize) -> Option<&FieldValue> {
        self.fields.get(index).map(|(_, value)| value)
    }

    /// Numeric value of `name`, for continuous and integer fields.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_f64)
    }

    /// Stable hex fingerprint of the record, used to correlate log lines.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Fingerprint::new();
        for (name, value) in &self.fields {
            hasher.update_field(name.as_bytes());
            match value {
                FieldValue::Continuous(v) => hasher.update_field(&v.to_bits().to_le_bytes()),
                other => hasher.update_field(other.to_string().as_bytes()),
            }
        }
        hasher.finish_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_deserialize_loosely() {
        let input: RawInput = serde_json::from_str(
            r#"{"Year": 2024, "Rainfall_mm": 1500.5, "Season": "Maha", "District": null, "Flag": true}"#,
        )
        .unwrap();

        assert_eq!(input.get("Year"), Some(&RawValue::Integer(2024)));
        assert_eq!(input.get("Rainfall_mm"), Some(&RawValue::Number(1500.5)));
        assert_eq!(input.get("Season"), Some(&RawValue::Text("Maha".into())));
        assert_eq!(input.get("District"), Some(&RawValue::Null));
        assert_eq!(input.get("Flag"), Some(&RawValue::Bool(true)));
    }

    #[test]
    fn nested_values_stay_per_field() {
        let input: RawInput =
            serde_json::from_str(r#"{"Season": ["Maha"], "Crop": {"name": "Paddy"}}"#).unwrap();
        assert_eq!(input.get("Season").map(RawValue::type_name), Some("array"));
        assert_eq!(input.get("Crop").map(RawValue::type_name), Some("object"));
    }

    #[test]
    fn duplicate_keys_survive_deserialization() {
        let input: RawInput =
            serde_json::from_str(r#"{"Season": "Maha", "Season": "Yala"}"#).unwrap();
        assert_eq!(input.len(), 2);
        assert_eq!(input.get("Season"), Some(&RawValue::Text("Maha".into())));
    }

    #[test]
    fn set_replaces_and_push_appends() {
        let mut input = RawInput::new().with("Crop", "Paddy");
        input.set("Crop", "Tea");
        assert_eq!(input.len(), 1);
        assert_eq!(input.get("Crop"), Some(&RawValue::Text("Tea".into())));

        input.push("Crop", "Maize");
        assert_eq!(input.len(), 2);
        input.remove("Crop");
        assert!(input.is_empty());
    }

    #[test]
    fn admits_checks_kind_and_domain() {
        let season = FieldSpec::categorical("Season", &["Maha", "Yala"]);
        assert!(season.admits(&FieldValue::Category("Yala".into())));
        assert!(!season.admits(&FieldValue::Category("Winter".into())));
        assert!(!season.admits(&FieldValue::Text("Maha".into())));

        let rain = FieldSpec::non_negative("Rainfall_mm");
        assert!(rain.admits(&FieldValue::Continuous(0.0)));
        assert!(!rain.admits(&FieldValue::Continuous(-0.1)));
        assert!(!rain.admits(&FieldValue::Continuous(f64::NAN)));
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Ignore".parse::<UnknownFieldPolicy>(), Ok(UnknownFieldPolicy::Ignore));
        assert_eq!(" reject ".parse::<UnknownFieldPolicy>(), Ok(UnknownFieldPolicy::Reject));
        assert!("drop".parse::<UnknownFieldPolicy>().is_err());
    }
}
