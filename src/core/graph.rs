//! Adapter between the engine and the resolution subsystem.

use tracing::debug;

use crate::error::Result;
use crate::resolve::{
    Artifact, DependencyNode, DependencyResolver, Project, RepositorySession, ResolutionRequest,
};

use super::model::{ArtifactCoordinates, ResolvedDependency};

pub struct GraphAdapter<'r> {
    resolver: &'r dyn DependencyResolver,
}

impl<'r> GraphAdapter<'r> {
    #[must_use]
    pub fn new(resolver: &'r dyn DependencyResolver) -> Self {
        Self { resolver }
    }

    /// Transitive runtime dependencies of `project`, in the order the
    /// resolver returns them.
    pub fn resolve_runtime_dependencies(
        &self,
        project: &Project,
        session: &RepositorySession,
    ) -> Result<Vec<ResolvedDependency>> {
        let request = ResolutionRequest::runtime(project, session);
        let result = self.resolver.resolve(&request)?;
        debug!(count = result.dependencies.len(), "runtime dependencies resolved");
        Ok(result
            .dependencies
            .into_iter()
            .map(ResolvedDependency::from)
            .collect())
    }
}

impl From<DependencyNode> for ResolvedDependency {
    fn from(node: DependencyNode) -> Self {
        let Artifact {
            group_id,
            artifact_id,
            version,
            extension,
            classifier,
            file,
        } = node.artifact;
        Self {
            coordinates: ArtifactCoordinates {
                group: group_id,
                name: artifact_id,
                version,
                extension,
                classifier: (!classifier.is_empty()).then_some(classifier),
            },
            scope: node.scope,
            file,
        }
    }
}
