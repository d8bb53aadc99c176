//! Filesystem source for the model artifact.
//!
//! The artifact is read exactly once. A failed load is logged and turned into
//! [`ModelSlot::Unavailable`] so the process keeps serving degraded responses
//! instead of exiting.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info};

use crate::common::config::AppCfg;
use crate::common::error::{ErrorCode, ModelError};
use crate::contract::FeatureContract;

use super::domain::{Exclusive, ModelSlot};
use super::gbt::GradientBoostedTrees;

/// Model artifact stored at a single path.
pub struct FsModelRepo {
    path: PathBuf,
    serialize_calls: bool,
}

impl FsModelRepo {
    /// Repository at `cfg.model_path`, honouring `serialize_model_calls`.
    pub fn new(cfg: &AppCfg) -> Self {
        Self {
            path: cfg.model_path.clone(),
            serialize_calls: cfg.serialize_model_calls,
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            serialize_calls: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the artifact without wrapping it.
    pub fn load(&self, contract: &FeatureContract) -> Result<GradientBoostedTrees, ModelError> {
        GradientBoostedTrees::from_file(&self.path, contract)
    }

    /// Attempt the one-time load and record the outcome.
    pub fn open(&self, contract: &FeatureContract) -> ModelSlot {
        let start = Instant::now();
        match self.load(contract) {
            Ok(model) => {
                info!(
                    ev = "model_load",
                    code = ErrorCode::Ok as u32,
                    dur_ms = start.elapsed().as_millis() as u64,
                    path = %self.path.display(),
                    model_id = %model.model_id,
                    model_version = %model.model_version,
                    trees = model.trees.len(),
                    serialized = self.serialize_calls,
                    "model loaded"
                );
                if self.serialize_calls {
                    ModelSlot::ready(Exclusive::new(model))
                } else {
                    ModelSlot::ready(model)
                }
            }
            Err(err) => {
                let reason = format!("{}: {err}", self.path.display());
                error!(
                    ev = "model_load",
                    code = ErrorCode::ModelNotLoaded as u32,
                    dur_ms = start.elapsed().as_millis() as u64,
                    error = %reason,
                    "model unavailable, serving degraded responses"
                );
                ModelSlot::unavailable(reason)
            }
        }
    }
}
