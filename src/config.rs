//! Layered configuration: defaults, global file, project file, environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DepageError, Result};
use crate::utils::expand_home;

/// Directory inside the project holding depage's own files.
pub const PROJECT_DIR_NAME: &str = ".depage";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, project_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("DEPAGE_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(project_dir)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("depage/config.toml"))
    }

    fn load_project(project_dir: &Path) -> Result<Option<ConfigPatch>> {
        let path = project_dir.join(PROJECT_DIR_NAME).join("config.toml");
        Self::load_patch(&path)
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| DepageError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| DepageError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.repository {
            self.repository.merge(patch);
        }
        if let Some(patch) = patch.gate {
            self.gate.merge(patch);
        }
        if let Some(patch) = patch.extract {
            self.extract.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_string("DEPAGE_LOCAL_REPOSITORY") {
            self.repository.local = value;
        }
        if let Some(value) = env_string("DEPAGE_STATE_DIR") {
            self.gate.state_dir = value;
        }
        if let Some(value) = env_bool("DEPAGE_FORCE")? {
            self.gate.force = value;
        }
        if let Some(value) = env_bool("DEPAGE_FILESYSTEM_FALLBACK")? {
            self.extract.filesystem_fallback = value;
        }
        Ok(())
    }

    /// Local repository with `~` expanded.
    #[must_use]
    pub fn local_repository(&self) -> PathBuf {
        expand_home(&self.repository.local)
    }

    /// State directory, relative paths taken from the project directory.
    #[must_use]
    pub fn state_dir(&self, project_dir: &Path) -> PathBuf {
        crate::utils::resolve_against(project_dir, &expand_home(&self.gate.state_dir))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_local_repository")]
    pub local: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            local: default_local_repository(),
        }
    }
}

impl RepositoryConfig {
    fn merge(&mut self, patch: RepositoryPatch) {
        if let Some(value) = patch.local {
            self.local = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
    /// Run even when the descriptor is unchanged.
    #[serde(default)]
    pub force: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            force: false,
        }
    }
}

impl GateConfig {
    fn merge(&mut self, patch: GatePatch) {
        if let Some(value) = patch.state_dir {
            self.state_dir = value;
        }
        if let Some(value) = patch.force {
            self.force = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Consult the archive-as-filesystem view when the index has no value.
    #[serde(default = "default_true")]
    pub filesystem_fallback: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            filesystem_fallback: true,
        }
    }
}

impl ExtractConfig {
    fn merge(&mut self, patch: ExtractPatch) {
        if let Some(value) = patch.filesystem_fallback {
            self.filesystem_fallback = value;
        }
    }
}

fn default_local_repository() -> String {
    "~/.m2/repository".to_string()
}

fn default_state_dir() -> String {
    PROJECT_DIR_NAME.to_string()
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub repository: Option<RepositoryPatch>,
    pub gate: Option<GatePatch>,
    pub extract: Option<ExtractPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RepositoryPatch {
    pub local: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GatePatch {
    pub state_dir: Option<String>,
    pub force: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ExtractPatch {
    pub filesystem_fallback: Option<bool>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_bool(key: &str) -> Result<Option<bool>> {
    let Ok(value) = std::env::var(key) else {
        return Ok(None);
    };
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(DepageError::Config(format!(
            "invalid {key} value {value} (expected true|false)"
        ))),
    }
}
