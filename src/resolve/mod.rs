//! Dependency resolution subsystem.
//!
//! The engine talks to resolution through [`DependencyResolver`] only. The
//! request and response shapes here are the subsystem's own; the graph
//! adapter in `core::graph` translates them into the engine's model.

pub mod descriptor;
pub mod local;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::model::Scope;

pub use descriptor::{DeclaredDependency, DescriptorError, Project, ProjectCoordinates};
pub use local::LocalRepositoryResolver;

/// Scopes whose dependencies are on the runtime classpath.
pub const RUNTIME_SCOPES: &[Scope] = &[Scope::Compile, Scope::Runtime];

/// Repository state shared by every resolution of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySession {
    pub local_repository: PathBuf,
}

impl RepositorySession {
    #[must_use]
    pub const fn new(local_repository: PathBuf) -> Self {
        Self { local_repository }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolutionRequest<'a> {
    pub project: &'a Project,
    pub session: &'a RepositorySession,
    pub scopes: &'static [Scope],
}

impl<'a> ResolutionRequest<'a> {
    #[must_use]
    pub const fn runtime(project: &'a Project, session: &'a RepositorySession) -> Self {
        Self {
            project,
            session,
            scopes: RUNTIME_SCOPES,
        }
    }

    #[must_use]
    pub fn includes(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }
}

/// An artifact as the resolver describes it. An empty classifier means none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub extension: String,
    pub classifier: String,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    pub artifact: Artifact,
    pub scope: Scope,
}

/// Conflict-free dependency list, in resolution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionResult {
    pub dependencies: Vec<DependencyNode>,
}

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("local repository does not exist: {}", path.display())]
    RepositoryMissing { path: PathBuf },

    #[error("artifact {coordinates} not found at {}", path.display())]
    ArtifactNotFound { coordinates: String, path: PathBuf },

    #[error("could not read dependencies of {coordinates}")]
    Descriptor {
        coordinates: String,
        #[source]
        source: DescriptorError,
    },
}

/// Resolves the dependency graph of a project.
pub trait DependencyResolver {
    fn resolve(&self, request: &ResolutionRequest<'_>) -> Result<ResolutionResult, ResolverError>;
}
