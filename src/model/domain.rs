//! The model seam: what the inference service needs from a trained artifact.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::common::error::{InferenceError, ModelError};
use crate::contract::PredictionRequest;

/// A loaded, read-only regression artifact shared by every request.
///
/// Implementations receive a record that already conforms to the contract the
/// service was built with, in trained column order.
pub trait ModelArtifact: Send + Sync {
    fn name(&self) -> &str {
        "model"
    }

    /// Raw model output for one record. The service expects exactly one value.
    fn predict(&self, record: &PredictionRequest) -> Result<Vec<f64>, ModelError>;
}

/// Artifact whose predict call needs exclusive access.
pub trait ModelArtifactMut: Send {
    fn name(&self) -> &str {
        "model"
    }

    fn predict(&mut self, record: &PredictionRequest) -> Result<Vec<f64>, ModelError>;
}

impl<T: ModelArtifact> ModelArtifactMut for T {
    fn name(&self) -> &str {
        ModelArtifact::name(self)
    }

    fn predict(&mut self, record: &PredictionRequest) -> Result<Vec<f64>, ModelError> {
        ModelArtifact::predict(self, record)
    }
}

/// Serializes predict calls behind a mutex so an artifact that is not safe
/// for concurrent invocation can still be shared.
pub struct Exclusive<M> {
    name: String,
    inner: Mutex<M>,
}

impl<M: ModelArtifactMut> Exclusive<M> {
    pub fn new(model: M) -> Self {
        Self {
            name: model.name().to_string(),
            inner: Mutex::new(model),
        }
    }
}

impl<M: ModelArtifactMut> ModelArtifact for Exclusive<M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, record: &PredictionRequest) -> Result<Vec<f64>, ModelError> {
        let mut guard = self.inner.lock().map_err(|_| ModelError::Poisoned)?;
        guard.predict(record)
    }
}

/// Outcome of the one-time model load.
#[derive(Clone)]
pub enum ModelSlot {
    Ready(Arc<dyn ModelArtifact>),
    /// Load failed; the service stays up and reports `ModelNotLoaded`.
    Unavailable { reason: String },
}

impl ModelSlot {
    pub fn ready(model: impl ModelArtifact + 'static) -> Self {
        ModelSlot::Ready(Arc::new(model))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ModelSlot::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelSlot::Ready(_))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ModelSlot::Ready(model) => Some(model.name()),
            ModelSlot::Unavailable { .. } => None,
        }
    }

    /// Loaded model, or `ModelNotLoaded` carrying the load failure.
    pub fn artifact(&self) -> Result<&dyn ModelArtifact, InferenceError> {
        match self {
            ModelSlot::Ready(model) => Ok(model.as_ref()),
            ModelSlot::Unavailable { reason } => Err(InferenceError::ModelNotLoaded {
                reason: reason.clone(),
            }),
        }
    }
}

impl fmt::Debug for ModelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSlot::Ready(model) => f.debug_tuple("Ready").field(&model.name()).finish(),
            ModelSlot::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}
