//! Gradient boosted regression trees serialized as JSON.
//!
//! The yield regressor is trained offline and exported to this format; the
//! runtime only evaluates it. `feature_names` must repeat the contract's field
//! names in trained order, which is checked once at load time so a stale
//! export can never serve predictions.
//!
//! ```text
//! prediction = base_score + learning_rate * sum(leaf reached in each tree)
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::error::ModelError;
use crate::contract::{FeatureContract, FieldValue, PredictionRequest};

use super::domain::ModelArtifact;

/// One node of a regression tree. Children always sit after their parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Go left when `value <= threshold`.
    Numeric {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Go left when the value is one of `categories`.
    Categorical {
        feature: usize,
        categories: Vec<String>,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

/// Serializable ensemble, loaded from JSON at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    pub model_id: String,
    #[serde(default)]
    pub model_version: String,
    pub feature_names: Vec<String>,
    pub base_score: f64,
    pub learning_rate: f64,
    pub trees: Vec<Tree>,
}

impl GradientBoostedTrees {
    /// Parse and validate against `contract`.
    pub fn from_json(json: &str, contract: &FeatureContract) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate(contract)?;
        Ok(model)
    }

    pub fn from_file(path: &Path, contract: &FeatureContract) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content, contract)
    }

    /// Check the ensemble is structurally sound and speaks `contract`.
    pub fn validate(&self, contract: &FeatureContract) -> Result<(), ModelError> {
        let expected: Vec<&str> = contract.names().collect();
        if self.feature_names != expected {
            let missing: Vec<&str> = expected
                .iter()
                .filter(|name| !self.feature_names.iter().any(|f| f == *name))
                .copied()
                .collect();
            let extra: Vec<&str> = self
                .feature_names
                .iter()
                .map(String::as_str)
                .filter(|f| !expected.contains(f))
                .collect();
            let detail = if missing.is_empty() && extra.is_empty() {
                "same fields in a different order".to_string()
            } else {
                format!("missing [{}], unexpected [{}]", missing.join(", "), extra.join(", "))
            };
            return Err(ModelError::FeatureMismatch(detail));
        }
        if !self.base_score.is_finite() {
            return Err(ModelError::NonFinite {
                name: "base_score",
                value: self.base_score,
            });
        }
        if !self.learning_rate.is_finite() {
            return Err(ModelError::NonFinite {
                name: "learning_rate",
                value: self.learning_rate,
            });
        }

        let fields = contract.fields();
        for (t, tree) in self.trees.iter().enumerate() {
            let invalid = |reason: String| ModelError::InvalidTree { tree: t, reason };
            if tree.nodes.is_empty() {
                return Err(invalid("tree has no nodes".to_string()));
            }
            let len = tree.nodes.len();
            for (idx, node) in tree.nodes.iter().enumerate() {
                let (feature, left, right, wants_numeric) = match node {
                    Node::Leaf { value } => {
                        if !value.is_finite() {
                            return Err(invalid(format!("node {idx}: non-finite leaf {value}")));
                        }
                        continue;
                    }
                    Node::Numeric {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if !threshold.is_finite() {
                            return Err(invalid(format!(
                                "node {idx}: non-finite threshold {threshold}"
                            )));
                        }
                        (*feature, *left, *right, true)
                    }
                    Node::Categorical {
                        feature,
                        left,
                        right,
                        ..
                    } => (*feature, *left, *right, false),
                };

                let Some(spec) = fields.get(feature) else {
                    return Err(invalid(format!("node {idx}: feature {feature} out of range")));
                };
                if spec.kind.is_numeric() != wants_numeric {
                    return Err(invalid(format!(
                        "node {idx}: {} split on {} field {}",
                        if wants_numeric { "numeric" } else { "categorical" },
                        spec.kind.as_str(),
                        spec.name
                    )));
                }
                for child in [left, right] {
                    if child <= idx || child >= len {
                        return Err(invalid(format!("node {idx}: child {child} is not after it")));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk one tree to its leaf. Each step must move to a later node, so the
    /// walk ends within `nodes.len()` steps even for an unvalidated ensemble.
    fn evaluate_tree(&self, tree: &Tree, record: &PredictionRequest) -> Result<f64, ModelError> {
        let mut idx = 0;
        loop {
            let node = tree.nodes.get(idx).ok_or_else(|| ModelError::Evaluation {
                feature: format!("node {idx}"),
                reason: "node index out of range".to_string(),
            })?;
            let next = match node {
                Node::Leaf { value } => return Ok(*value),
                Node::Numeric {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = feature_value(record, *feature)?;
                    let Some(x) = value.as_f64() else {
                        return Err(kind_error(*feature, value, "numeric"));
                    };
                    if x <= *threshold {
                        *left
                    } else {
                        *right
                    }
                }
                Node::Categorical {
                    feature,
                    categories,
                    left,
                    right,
                } => {
                    let value = feature_value(record, *feature)?;
                    let Some(s) = value.as_str() else {
                        return Err(kind_error(*feature, value, "categorical"));
                    };
                    if categories.iter().any(|c| c == s) {
                        *left
                    } else {
                        *right
                    }
                }
            };
            if next <= idx {
                return Err(ModelError::Evaluation {
                    feature: format!("node {idx}"),
                    reason: format!("child {next} is not after its parent"),
                });
            }
            idx = next;
        }
    }
}

fn feature_value(record: &PredictionRequest, feature: usize) -> Result<&FieldValue, ModelError> {
    record.value_at(feature).ok_or_else(|| ModelError::Evaluation {
        feature: feature.to_string(),
        reason: format!("record has only {} values", record.len()),
    })
}

fn kind_error(feature: usize, value: &FieldValue, wanted: &str) -> ModelError {
    ModelError::Evaluation {
        feature: feature.to_string(),
        reason: format!("{wanted} split reached a {} value", value.kind().as_str()),
    }
}

impl ModelArtifact for GradientBoostedTrees {
    fn name(&self) -> &str {
        &self.model_id
    }

    fn predict(&self, record: &PredictionRequest) -> Result<Vec<f64>, ModelError> {
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += self.evaluate_tree(tree, record)?;
        }
        Ok(vec![self.base_score + self.learning_rate * sum])
    }
}
