//! Values passed between the engine components.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::archive::ArchiveError;

/// Dependency scope as declared in a project descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Runtime,
    Provided,
    Test,
    System,
}

impl Scope {
    /// Scope a dependency of a `self`-scoped dependency ends up with, `None`
    /// if it does not propagate.
    #[must_use]
    pub const fn mediate(self, child: Self) -> Option<Self> {
        match (self, child) {
            (Self::Compile, Self::Compile) => Some(Self::Compile),
            (Self::Compile | Self::Runtime, Self::Runtime)
            | (Self::Runtime, Self::Compile) => Some(Self::Runtime),
            (Self::Provided, Self::Compile | Self::Runtime) => Some(Self::Provided),
            (Self::Test, Self::Compile | Self::Runtime) => Some(Self::Test),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Compile => "compile",
            Self::Runtime => "runtime",
            Self::Provided => "provided",
            Self::Test => "test",
            Self::System => "system",
        };
        f.write_str(name)
    }
}

/// Identity of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactCoordinates {
    pub group: String,
    pub name: String,
    pub version: String,
    pub extension: String,
    pub classifier: Option<String>,
}

impl ArtifactCoordinates {
    /// Identity used for conflict resolution: everything but the version.
    #[must_use]
    pub fn versionless_key(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}:{}:{}:{classifier}",
                self.group, self.name, self.extension
            ),
            None => format!("{}:{}:{}", self.group, self.name, self.extension),
        }
    }
}

impl fmt::Display for ArtifactCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.group, self.name, self.version, self.extension
        )?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

/// A dependency produced by resolution for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub coordinates: ArtifactCoordinates,
    pub scope: Scope,
    pub file: Option<PathBuf>,
}

/// When an archive was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CreationTimestamp(DateTime<Utc>);

impl CreationTimestamp {
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    /// Calendar date in the local timezone.
    #[must_use]
    pub fn local_date(&self) -> NaiveDate {
        self.0.with_timezone(&Local).date_naive()
    }
}

impl From<DateTime<Utc>> for CreationTimestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

/// Result of looking for the creation time of one dependency archive.
#[derive(Debug)]
pub enum ExtractionOutcome {
    Found(CreationTimestamp),
    /// The archive was readable but carried no usable timestamp.
    NotFound,
    /// The archive could not be opened or read.
    Failed(ArchiveError),
}

impl ExtractionOutcome {
    #[must_use]
    pub const fn timestamp(&self) -> Option<CreationTimestamp> {
        match self {
            Self::Found(timestamp) => Some(*timestamp),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
