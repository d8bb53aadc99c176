//! Runtime configuration: built-in defaults, then an optional TOML file named
//! by `YIELDCAST_CONFIG`, then individual environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::contract::UnknownFieldPolicy;

pub const CONFIG_ENV: &str = "YIELDCAST_CONFIG";
pub const MODEL_PATH_ENV: &str = "YIELDCAST_MODEL_PATH";
pub const SERIALIZE_MODEL_ENV: &str = "YIELDCAST_SERIALIZE_MODEL";
pub const UNKNOWN_FIELDS_ENV: &str = "YIELDCAST_UNKNOWN_FIELDS";
pub const LOG_ENV: &str = "YIELDCAST_LOG";
pub const LOG_JSON_ENV: &str = "YIELDCAST_LOG_JSON";

pub const DEFAULT_MODEL_PATH: &str = "best_model_tuned.json";

/// Snapshot of configuration values consumed by the core.
#[derive(Clone, Debug, PartialEq)]
pub struct AppCfg {
    pub model_path: PathBuf,
    /// Serialize model calls behind a mutex.
    pub serialize_model_calls: bool,
    pub unknown_fields: UnknownFieldPolicy,
    pub log_filter: String,
    pub log_json: bool,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            serialize_model_calls: false,
            unknown_fields: UnknownFieldPolicy::Reject,
            log_filter: "info".to_string(),
            log_json: false,
        }
    }
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same layering as [`AppCfg::load`] with an injectable environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(path) = non_empty(lookup(CONFIG_ENV)) {
            cfg.apply_file(Path::new(&path))?;
        }
        cfg.apply_env(&lookup);
        Ok(cfg)
    }

    /// Merge a TOML file over the current values.
    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading config file {}", path.display()))?;
        let file_cfg: FileConfig = toml::from_str(&raw)
            .with_context(|| format!("failed parsing TOML config {}", path.display()))?;

        if let Some(model) = file_cfg.model {
            if let Some(v) = non_empty(model.path) {
                self.model_path = PathBuf::from(v);
            }
            if let Some(v) = model.serialize_calls {
                self.serialize_model_calls = v;
            }
        }
        if let Some(contract) = file_cfg.contract {
            if let Some(v) = contract.unknown_fields {
                self.unknown_fields = v;
            }
        }
        if let Some(log) = file_cfg.log {
            if let Some(v) = non_empty(log.filter) {
                self.log_filter = v;
            }
            if let Some(v) = log.json {
                self.log_json = v;
            }
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = non_empty(lookup(MODEL_PATH_ENV)) {
            self.model_path = PathBuf::from(v);
        }
        if let Some(v) = non_empty(lookup(SERIALIZE_MODEL_ENV)).and_then(|v| parse_bool(&v)) {
            self.serialize_model_calls = v;
        }
        if let Some(v) = non_empty(lookup(UNKNOWN_FIELDS_ENV)).and_then(|v| v.parse().ok()) {
            self.unknown_fields = v;
        }
        if let Some(v) = non_empty(lookup(LOG_ENV)) {
            self.log_filter = v;
        }
        if let Some(v) = non_empty(lookup(LOG_JSON_ENV)).and_then(|v| parse_bool(&v)) {
            self.log_json = v;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    model: Option<FileModelConfig>,
    contract: Option<FileContractConfig>,
    log: Option<FileLogConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct FileModelConfig {
    path: Option<String>,
    serialize_calls: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FileContractConfig {
    unknown_fields: Option<UnknownFieldPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct FileLogConfig {
    filter: Option<String>,
    json: Option<bool>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_environment() {
        let cfg = AppCfg::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, AppCfg::default());
        assert_eq!(cfg.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(cfg.unknown_fields, UnknownFieldPolicy::Reject);
    }

    #[test]
    fn env_overrides_defaults() {
        let cfg = AppCfg::from_lookup(lookup_from(&[
            (MODEL_PATH_ENV, "/srv/models/gbr.json"),
            (SERIALIZE_MODEL_ENV, "yes"),
            (UNKNOWN_FIELDS_ENV, "ignore"),
            (LOG_ENV, "yieldcast=debug"),
            (LOG_JSON_ENV, "1"),
        ]))
        .unwrap();

        assert_eq!(cfg.model_path, PathBuf::from("/srv/models/gbr.json"));
        assert!(cfg.serialize_model_calls);
        assert_eq!(cfg.unknown_fields, UnknownFieldPolicy::Ignore);
        assert_eq!(cfg.log_filter, "yieldcast=debug");
        assert!(cfg.log_json);
    }

    #[test]
    fn invalid_env_values_keep_previous_layer() {
        let cfg = AppCfg::from_lookup(lookup_from(&[
            (SERIALIZE_MODEL_ENV, "maybe"),
            (UNKNOWN_FIELDS_ENV, "sometimes"),
            (MODEL_PATH_ENV, "   "),
        ]))
        .unwrap();
        assert_eq!(cfg, AppCfg::default());
    }

    #[test]
    fn file_layer_sits_under_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[model]\npath = \"from-file.json\"\nserialize_calls = true\n\n[contract]\nunknown_fields = \"ignore\"\n\n[log]\nfilter = \"warn\"\n"
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cfg = AppCfg::from_lookup(lookup_from(&[
            (CONFIG_ENV, path.as_str()),
            (MODEL_PATH_ENV, "from-env.json"),
        ]))
        .unwrap();

        assert_eq!(cfg.model_path, PathBuf::from("from-env.json"));
        assert!(cfg.serialize_model_calls);
        assert_eq!(cfg.unknown_fields, UnknownFieldPolicy::Ignore);
        assert_eq!(cfg.log_filter, "warn");
        assert!(!cfg.log_json);
    }

    #[test]
    fn unreadable_or_malformed_file_is_an_error() {
        let missing = AppCfg::from_lookup(lookup_from(&[(CONFIG_ENV, "/nonexistent/yieldcast.toml")]));
        assert!(missing.is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model\npath = ").unwrap();
        let path = file.path().to_string_lossy().to_string();
        let err = AppCfg::from_lookup(lookup_from(&[(CONFIG_ENV, path.as_str())])).unwrap_err();
        assert!(err.to_string().contains("failed parsing TOML config"));
    }
}
