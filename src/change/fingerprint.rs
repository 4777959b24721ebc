//! Content fingerprints of build descriptors.
//!
//! State lives in `<state_dir>/state.toml`, one SHA-256 per descriptor path:
//!
//! ```toml
//! [descriptors]
//! "/work/app/depage.toml" = "9f86d08..."
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{DepageError, Result};
use crate::utils::ensure_dir;

use super::ChangeDetector;

const STATE_FILE: &str = "state.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
struct BuildState {
    #[serde(default)]
    descriptors: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct FingerprintDetector {
    state_dir: PathBuf,
}

impl FingerprintDetector {
    #[must_use]
    pub const fn new(state_dir: PathBuf) -> Self {
        Self { state_dir }
    }

    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.state_dir.join(STATE_FILE)
    }

    fn load(&self) -> Result<BuildState> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(BuildState::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(|err| {
            DepageError::ChangeDetection(format!("read state {}: {err}", path.display()))
        })?;
        toml::from_str(&raw).map_err(|err| {
            DepageError::ChangeDetection(format!("parse state {}: {err}", path.display()))
        })
    }

    fn save(&self, state: &BuildState) -> Result<()> {
        ensure_dir(&self.state_dir)?;
        let raw = toml::to_string(state)
            .map_err(|err| DepageError::Serialization(format!("encode build state: {err}")))?;
        let path = self.state_path();
        let mut staged = tempfile::NamedTempFile::new_in(&self.state_dir)?;
        staged.write_all(raw.as_bytes())?;
        staged
            .persist(&path)
            .map_err(|err| DepageError::ChangeDetection(format!("write state {}: {err}", path.display())))?;
        Ok(())
    }
}

impl ChangeDetector for FingerprintDetector {
    fn has_changed(&self, descriptor: &Path) -> Result<bool> {
        let current = fingerprint(descriptor)?;
        let state = self.load()?;
        let changed = state.descriptors.get(&key(descriptor)) != Some(&current);
        debug!(descriptor = %descriptor.display(), changed, "descriptor fingerprint checked");
        Ok(changed)
    }

    fn record(&self, descriptor: &Path) -> Result<()> {
        let current = fingerprint(descriptor)?;
        let mut state = self.load()?;
        state.descriptors.insert(key(descriptor), current);
        self.save(&state)
    }
}

fn fingerprint(descriptor: &Path) -> Result<String> {
    let bytes = std::fs::read(descriptor).map_err(|err| {
        DepageError::ChangeDetection(format!("read descriptor {}: {err}", descriptor.display()))
    })?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn key(descriptor: &Path) -> String {
    descriptor
        .canonicalize()
        .unwrap_or_else(|_| descriptor.to_path_buf())
        .display()
        .to_string()
}
