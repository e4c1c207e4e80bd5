// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::info;

/// Environment variable naming an optional YAML file that overrides the defaults.
pub const CONFIG_ENV: &str = "INDICATOR_REPORT_CONFIG";

/// Where the pipeline reads from and writes to. Every field has a default, so
/// a run needs no configuration at all.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub input: PathBuf,
    pub output_sheet: PathBuf,
    /// Parquet copy of the augmented table; `null` disables it.
    pub output_parquet: Option<PathBuf>,
    pub report: PathBuf,
    /// Directory for the transient chart images.
    pub chart_dir: PathBuf,
    pub region: String,
    /// Rows shown in the report's sample tables.
    pub sample_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("indicators.xlsx"),
            output_sheet: PathBuf::from("indicator_analysis.xlsx"),
            output_parquet: Some(PathBuf::from("indicator_analysis.parquet")),
            report: PathBuf::from("indicator_report.html"),
            chart_dir: PathBuf::from("."),
            region: "Maranhão".to_string(),
            sample_rows: 10,
        }
    }
}

impl Config {
    /// Defaults, overridden by the YAML file named in `INDICATOR_REPORT_CONFIG` if set.
    pub fn load() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                let cfg = Self::from_yaml_file(path.trim())?;
                info!(path = %path.trim(), "loaded config");
                Ok(cfg)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {:?}", path))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}
