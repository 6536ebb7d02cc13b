//! Workspace configuration stored under `.cardflow/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::atomic::write_atomic;

/// Cardflow configuration (TOML).
///
/// This file is intended to be edited by humans. Missing fields default to
/// the standard `.cardflow/` layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CardflowConfig {
    pub files: FilesConfig,
    pub submit: SubmitConfig,
}

/// Data file names, relative to `.cardflow/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilesConfig {
    /// Card type catalog (JSON array of card type configs).
    pub catalog: String,
    /// Base column descriptors written by the loader stage.
    pub columns: String,
    /// Filter state written by the filter stage.
    pub filters: String,
    /// Persisted pipeline document.
    pub pipeline: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            catalog: "catalog.json".to_string(),
            columns: "columns.json".to_string(),
            filters: "filters.json".to_string(),
            pipeline: "pipeline.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SubmitConfig {
    /// Directory (relative to `.cardflow/`) receiving evaluation requests.
    pub requests_dir: String,
    /// Pretty-print written requests.
    pub pretty: bool,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            requests_dir: "requests".to_string(),
            pretty: true,
        }
    }
}

impl CardflowConfig {
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("files.catalog", &self.files.catalog),
            ("files.columns", &self.files.columns),
            ("files.filters", &self.files.filters),
            ("files.pipeline", &self.files.pipeline),
            ("submit.requests_dir", &self.submit.requests_dir),
        ];
        for (name, value) in names {
            if value.trim().is_empty() {
                return Err(anyhow!("{} must be non-empty", name));
            }
            if Path::new(value).is_absolute() {
                return Err(anyhow!("{} must be relative to .cardflow/", name));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CardflowConfig::default()`.
pub fn load_config(path: &Path) -> Result<CardflowConfig> {
    if !path.exists() {
        let cfg = CardflowConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CardflowConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &CardflowConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, CardflowConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let mut cfg = CardflowConfig::default();
        cfg.submit.pretty = false;
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[files]\ncolumns = \"loaded.json\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.files.columns, "loaded.json");
        assert_eq!(cfg.files.catalog, "catalog.json");
        assert_eq!(cfg.submit, SubmitConfig::default());
    }

    #[test]
    fn absolute_paths_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[submit]\nrequests_dir = \"/tmp/out\"\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("submit.requests_dir must be relative"));
    }
}
