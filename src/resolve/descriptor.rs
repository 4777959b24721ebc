//! Project descriptors (`depage.toml`).
//!
//! ```toml
//! [project]
//! group = "com.example"
//! name = "app"
//! version = "1.0.0"
//!
//! [[dependencies]]
//! group = "stax-utils"
//! name = "stax-utils"
//! version = "20070216"
//! scope = "runtime"
//! ```
//!
//! The same format describes an installed artifact's own dependencies, stored
//! next to it in the local repository.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::core::model::{ArtifactCoordinates, Scope};

pub const DEFAULT_DESCRIPTOR: &str = "depage.toml";

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("could not read descriptor {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse descriptor {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid descriptor {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCoordinates {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl fmt::Display for ProjectCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// A dependency as declared, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub group: String,
    pub name: String,
    pub version: String,
    pub kind: String,
    pub classifier: Option<String>,
    pub scope: Scope,
    pub optional: bool,
}

impl DeclaredDependency {
    #[must_use]
    pub fn coordinates(&self) -> ArtifactCoordinates {
        let (extension, implied_classifier) = type_extension(&self.kind);
        ArtifactCoordinates {
            group: self.group.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            extension: extension.to_string(),
            classifier: self
                .classifier
                .clone()
                .or_else(|| implied_classifier.map(str::to_string)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub descriptor_path: PathBuf,
    pub coordinates: ProjectCoordinates,
    pub dependencies: Vec<DeclaredDependency>,
}

impl Project {
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let raw = std::fs::read_to_string(path).map_err(|source| DescriptorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Self, DescriptorError> {
        let file: DescriptorFile = toml::from_str(raw).map_err(|source| DescriptorError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let invalid = |message: String| DescriptorError::Invalid {
            path: path.to_path_buf(),
            message,
        };

        require("project.group", &file.project.group).map_err(invalid)?;
        require("project.name", &file.project.name).map_err(invalid)?;
        require("project.version", &file.project.version).map_err(invalid)?;

        let mut dependencies = Vec::with_capacity(file.dependencies.len());
        for (position, dependency) in file.dependencies.into_iter().enumerate() {
            for (field, value) in [
                ("group", &dependency.group),
                ("name", &dependency.name),
                ("version", &dependency.version),
                ("type", &dependency.kind),
            ] {
                require(&format!("dependencies[{position}].{field}"), value).map_err(invalid)?;
            }
            dependencies.push(DeclaredDependency {
                group: dependency.group,
                name: dependency.name,
                version: dependency.version,
                kind: dependency.kind,
                classifier: dependency.classifier.filter(|c| !c.is_empty()),
                scope: dependency.scope,
                optional: dependency.optional,
            });
        }

        Ok(Self {
            descriptor_path: path.to_path_buf(),
            coordinates: ProjectCoordinates {
                group: file.project.group,
                name: file.project.name,
                version: file.project.version,
            },
            dependencies,
        })
    }
}

/// File extension for a dependency type, plus the classifier the type
/// implies.
#[must_use]
pub fn type_extension(kind: &str) -> (&str, Option<&'static str>) {
    match kind {
        "test-jar" => ("jar", Some("tests")),
        "maven-plugin" | "ejb" | "ejb-client" | "bundle" => ("jar", None),
        "java-source" => ("jar", Some("sources")),
        "javadoc" => ("jar", Some("javadoc")),
        other => (other, None),
    }
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} must not be empty"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorFile {
    project: ProjectSection,
    #[serde(default)]
    dependencies: Vec<DependencySection>,
}

#[derive(Debug, Deserialize)]
struct ProjectSection {
    group: String,
    name: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct DependencySection {
    group: String,
    name: String,
    version: String,
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
    #[serde(default)]
    classifier: Option<String>,
    #[serde(default)]
    scope: Scope,
    #[serde(default)]
    optional: bool,
}

fn default_kind() -> String {
    "jar".to_string()
}
