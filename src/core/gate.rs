//! The build gate: one engine run per build invocation.
//!
//! ```text
//! Idle -> Gated
//! Idle -> Resolving -> Resolved -> Extracting(0) -> Reporting(0) -> Extracting(1) ... -> Done
//! Resolving | Extracting(i) -> Aborted
//! ```

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::change::ChangeDetector;
use crate::error::{DepageError, Result};
use crate::resolve::{Project, RepositorySession};

use super::extract::TimestampExtractor;
use super::graph::GraphAdapter;
use super::model::ExtractionOutcome;
use super::report::AgeReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Gated,
    Resolving,
    Resolved { count: usize },
    Extracting(usize),
    Reporting(usize),
    Done,
    Aborted,
}

impl RunState {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Gated | Self::Done | Self::Aborted)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Gated => f.write_str("gated"),
            Self::Resolving => f.write_str("resolving"),
            Self::Resolved { count } => write!(f, "resolved({count})"),
            Self::Extracting(index) => write!(f, "extracting[{index}]"),
            Self::Reporting(index) => write!(f, "reporting[{index}]"),
            Self::Done => f.write_str("done"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

/// Age of one dependency as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyAge {
    pub dependency: String,
    pub created: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub dependencies: Vec<DependencyAge>,
}

impl RunSummary {
    #[must_use]
    pub fn dated(&self) -> usize {
        self.dependencies
            .iter()
            .filter(|age| age.created.is_some())
            .count()
    }

    #[must_use]
    pub fn undated(&self) -> usize {
        self.dependencies.len() - self.dated()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The descriptor did not change; nothing ran.
    Skipped,
    Completed(RunSummary),
}

pub struct BuildGate<'a> {
    graph: GraphAdapter<'a>,
    extractor: &'a TimestampExtractor,
    reporter: AgeReporter<'a>,
    state: RunState,
}

impl<'a> BuildGate<'a> {
    #[must_use]
    pub const fn new(
        graph: GraphAdapter<'a>,
        extractor: &'a TimestampExtractor,
        reporter: AgeReporter<'a>,
    ) -> Self {
        Self {
            graph,
            extractor,
            reporter,
            state: RunState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = %self.state, to = %next, "run state");
        self.state = next;
    }

    /// Run the engine for `project` unless its descriptor is unchanged.
    ///
    /// Aborts on the first resolution failure or unreadable archive; no
    /// dependency after the unreadable one is processed.
    pub fn run(
        &mut self,
        project: &Project,
        session: &RepositorySession,
        change_detector: &dyn ChangeDetector,
    ) -> Result<RunOutcome> {
        self.transition(RunState::Idle);

        let changed = match change_detector.has_changed(&project.descriptor_path) {
            Ok(changed) => changed,
            Err(err) => {
                self.transition(RunState::Aborted);
                return Err(err);
            }
        };
        if !changed {
            self.transition(RunState::Gated);
            return Ok(RunOutcome::Skipped);
        }

        self.transition(RunState::Resolving);
        let dependencies = match self.graph.resolve_runtime_dependencies(project, session) {
            Ok(dependencies) => dependencies,
            Err(err) => {
                self.transition(RunState::Aborted);
                return Err(err);
            }
        };
        self.transition(RunState::Resolved {
            count: dependencies.len(),
        });

        let mut summary = RunSummary::default();
        for (index, dependency) in dependencies.iter().enumerate() {
            self.transition(RunState::Extracting(index));
            let outcome = self.extractor.extract(dependency);
            if let ExtractionOutcome::Failed(source) = outcome {
                self.transition(RunState::Aborted);
                return Err(DepageError::ArchiveUnreadable {
                    dependency: dependency.coordinates.to_string(),
                    source,
                });
            }

            self.transition(RunState::Reporting(index));
            summary.dependencies.push(DependencyAge {
                dependency: dependency.coordinates.to_string(),
                created: outcome.timestamp().map(|created| created.local_date()),
            });
            self.reporter.report(dependency, outcome)?;
        }

        self.transition(RunState::Done);
        Ok(RunOutcome::Completed(summary))
    }
}
