//! The dependency age engine.
//!
//! Gate → graph adapter → (per dependency) extractor → reporter.

pub mod extract;
pub mod gate;
pub mod graph;
pub mod model;
pub mod report;

pub use extract::TimestampExtractor;
pub use gate::{BuildGate, DependencyAge, RunOutcome, RunState, RunSummary};
pub use graph::GraphAdapter;
pub use model::{
    ArtifactCoordinates, CreationTimestamp, ExtractionOutcome, ResolvedDependency, Scope,
};
pub use report::{AgeReporter, ReportSink, TracingSink};
