//! `ltifmu.toml` configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name searched for from the working directory upward.
pub const CONFIG_FILE_NAME: &str = "ltifmu.toml";

/// The top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LtifmuConfig {
    /// Build defaults.
    #[serde(default)]
    pub build: BuildSection,
    /// Native compiler settings.
    #[serde(default)]
    pub toolchain: ToolchainSection,
    /// Runtime skeleton location.
    #[serde(default)]
    pub runtime: RuntimeSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildSection {
    /// Euler step exported to the generated source.
    #[serde(default)]
    pub step_size: Option<f64>,
    /// Whether `sources/` is retained in the archive.
    #[serde(default)]
    pub keep_sources: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ToolchainSection {
    /// Compiler executable, overriding the platform default.
    #[serde(default)]
    pub compiler: Option<String>,
    /// Extra compiler flags.
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuntimeSection {
    /// Skeleton directory; relative paths are relative to the config file.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// A configuration together with the directory it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: LtifmuConfig,
    pub dir: PathBuf,
}

impl LoadedConfig {
    /// Runtime directory from the file, resolved against its location.
    pub fn runtime_dir(&self) -> Option<PathBuf> {
        self.config.runtime.dir.as_ref().map(|d| self.dir.join(d))
    }
}

impl LtifmuConfig {
    /// Search upward from `start_dir` for `ltifmu.toml`, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<LoadedConfig>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config = Self::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some(LoadedConfig { config, dir }));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        if let Some(step) = config.build.step_size {
            anyhow::ensure!(
                step.is_finite() && step > 0.0,
                "build.step-size must be finite and positive, found {step}"
            );
        }
        Ok(config)
    }
}
