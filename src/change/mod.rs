//! Build descriptor change detection.

pub mod fingerprint;

use std::path::Path;

use crate::error::Result;

pub use fingerprint::FingerprintDetector;

/// Answers whether a build descriptor changed since the last recorded build.
pub trait ChangeDetector {
    fn has_changed(&self, descriptor: &Path) -> Result<bool>;

    /// Remember the descriptor's current state as the last build.
    fn record(&self, descriptor: &Path) -> Result<()>;
}

/// Treats every build as changed; used for forced runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysChanged;

impl ChangeDetector for AlwaysChanged {
    fn has_changed(&self, _descriptor: &Path) -> Result<bool> {
        Ok(true)
    }

    fn record(&self, _descriptor: &Path) -> Result<()> {
        Ok(())
    }
}
