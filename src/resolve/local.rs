//! Resolution against a local repository in the Maven directory layout.
//!
//! `<repo>/<group with dots as slashes>/<name>/<version>/<name>-<version>[-<classifier>].<ext>`
//!
//! An artifact may ship its own descriptor beside it as
//! `<name>-<version>.depage.toml`; its dependencies are resolved
//! transitively. The walk is breadth-first, so the dependency nearest to the
//! project wins a conflict, and the first declaration wins among equals.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::core::model::{ArtifactCoordinates, Scope};

use super::descriptor::{DeclaredDependency, Project};
use super::{
    Artifact, DependencyNode, DependencyResolver, ResolutionRequest, ResolutionResult,
    ResolverError,
};

const ARTIFACT_DESCRIPTOR_SUFFIX: &str = "depage.toml";

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalRepositoryResolver;

struct Pending {
    dependency: DeclaredDependency,
    scope: Scope,
}

impl LocalRepositoryResolver {
    #[must_use]
    pub fn artifact_path(repository: &Path, coordinates: &ArtifactCoordinates) -> PathBuf {
        let file_name = match &coordinates.classifier {
            Some(classifier) => format!(
                "{}-{}-{classifier}.{}",
                coordinates.name, coordinates.version, coordinates.extension
            ),
            None => format!(
                "{}-{}.{}",
                coordinates.name, coordinates.version, coordinates.extension
            ),
        };
        version_dir(repository, coordinates).join(file_name)
    }

    #[must_use]
    pub fn descriptor_path(repository: &Path, coordinates: &ArtifactCoordinates) -> PathBuf {
        version_dir(repository, coordinates).join(format!(
            "{}-{}.{ARTIFACT_DESCRIPTOR_SUFFIX}",
            coordinates.name, coordinates.version
        ))
    }
}

impl DependencyResolver for LocalRepositoryResolver {
    fn resolve(&self, request: &ResolutionRequest<'_>) -> Result<ResolutionResult, ResolverError> {
        let repository = &request.session.local_repository;
        if !repository.is_dir() {
            return Err(ResolverError::RepositoryMissing {
                path: repository.clone(),
            });
        }

        let mut queue: VecDeque<Pending> = request
            .project
            .dependencies
            .iter()
            .filter(|dependency| request.includes(dependency.scope))
            .map(|dependency| Pending {
                dependency: dependency.clone(),
                scope: dependency.scope,
            })
            .collect();

        let mut seen = HashSet::new();
        let mut result = ResolutionResult::default();

        while let Some(pending) = queue.pop_front() {
            let coordinates = pending.dependency.coordinates();
            if !seen.insert(coordinates.versionless_key()) {
                trace!(dependency = %coordinates, "omitted for conflict");
                continue;
            }

            let path = Self::artifact_path(repository, &coordinates);
            if !path.is_file() {
                return Err(ResolverError::ArtifactNotFound {
                    coordinates: coordinates.to_string(),
                    path,
                });
            }

            let descriptor = Self::descriptor_path(repository, &coordinates);
            if descriptor.is_file() {
                let artifact_project =
                    Project::load(&descriptor).map_err(|source| ResolverError::Descriptor {
                        coordinates: coordinates.to_string(),
                        source,
                    })?;
                for child in artifact_project.dependencies {
                    if child.optional {
                        continue;
                    }
                    let Some(scope) = pending.scope.mediate(child.scope) else {
                        continue;
                    };
                    if request.includes(scope) {
                        queue.push_back(Pending {
                            dependency: child,
                            scope,
                        });
                    }
                }
            }

            result.dependencies.push(DependencyNode {
                artifact: Artifact {
                    group_id: coordinates.group,
                    artifact_id: coordinates.name,
                    version: coordinates.version,
                    extension: coordinates.extension,
                    classifier: coordinates.classifier.unwrap_or_default(),
                    file: Some(path),
                },
                scope: pending.scope,
            });
        }

        debug!(
            project = %request.project.coordinates.name,
            resolved = result.dependencies.len(),
            "resolved dependency graph"
        );
        Ok(result)
    }
}

fn version_dir(repository: &Path, coordinates: &ArtifactCoordinates) -> PathBuf {
    let mut dir = repository.to_path_buf();
    for segment in coordinates.group.split('.') {
        dir.push(segment);
    }
    dir.push(&coordinates.name);
    dir.push(&coordinates.version);
    dir
}
