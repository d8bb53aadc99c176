//! Model artifacts: the seam the service predicts through, the bundled
//! gradient boosted trees format and its filesystem loader.

pub mod domain;
pub mod gbt;
pub mod repo_fs;

pub use domain::{Exclusive, ModelArtifact, ModelArtifactMut, ModelSlot};
pub use gbt::GradientBoostedTrees;
pub use repo_fs::FsModelRepo;
