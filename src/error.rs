//! Crate-wide error type.

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::resolve::{DescriptorError, ResolverError};

pub type Result<T> = std::result::Result<T, DepageError>;

#[derive(Debug, Error)]
pub enum DepageError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("change detection failed: {0}")]
    ChangeDetection(String),

    /// The dependency graph could not be built. Aborts the run.
    #[error("could not resolve dependencies")]
    Resolution(#[from] ResolverError),

    /// An archive listed by resolution cannot be opened or read. Aborts the run.
    #[error("could not open jar of: {dependency}")]
    ArchiveUnreadable {
        dependency: String,
        #[source]
        source: ArchiveError,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DepageError {
    /// Stable machine-readable code for robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Descriptor(_) => "descriptor",
            Self::ChangeDetection(_) => "change_detection",
            Self::Resolution(_) => "resolution_failure",
            Self::ArchiveUnreadable { .. } => "archive_unreadable",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }

    /// Messages of this error and every underlying cause, outermost first.
    #[must_use]
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            messages.push(cause.to_string());
            current = cause.source();
        }
        messages
    }
}
