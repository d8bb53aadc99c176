//! Inference outputs.

use std::fmt;

use crate::contract::PredictionRequest;

/// Outcome of a single inference call.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionResult {
    /// Predicted yield in metric tons per hectare.
    pub predicted_yield: f64,
    /// `predicted_yield * Area_Harvested_ha`, or `None` when the harvested
    /// area is absent or not finite.
    pub estimated_production: Option<f64>,
    /// The record the model was called with.
    pub request: PredictionRequest,
}

/// Total production for a yield over a harvested area. Undefined areas stay
/// undefined rather than collapsing to zero.
pub fn production(predicted_yield: f64, harvested_area: Option<f64>) -> Option<f64> {
    harvested_area
        .filter(|area| area.is_finite())
        .map(|area| predicted_yield * area)
        .filter(|produced| produced.is_finite())
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicted Yield: {:.2} mt/ha", self.predicted_yield)?;
        match self.estimated_production {
            Some(total) => write!(f, "; Estimated Production: {total:.1} metric tons"),
            None => write!(f, "; Estimated Production: undefined"),
        }
    }
}
