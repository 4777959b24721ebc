//! depage list - report the age of every runtime dependency

use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::app::AppContext;
use crate::change::{AlwaysChanged, ChangeDetector, FingerprintDetector};
use crate::cli::output::{emit_robot, robot_ok};
use crate::core::{
    AgeReporter, BuildGate, GraphAdapter, RunOutcome, RunSummary, TimestampExtractor, TracingSink,
};
use crate::error::Result;
use crate::resolve::{LocalRepositoryResolver, Project};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Run even when the project descriptor is unchanged since the last build
    #[arg(long)]
    pub force: bool,

    /// Only read the manifest's creation time from the archive index
    #[arg(long)]
    pub no_fallback: bool,
}

#[derive(Serialize)]
struct ListReport {
    project: String,
    skipped: bool,
    dated: usize,
    undated: usize,
    #[serde(flatten)]
    summary: RunSummary,
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let project = Project::load(&ctx.descriptor_path)?;
    debug!(
        project = %project.coordinates,
        descriptor = %ctx.descriptor_path.display(),
        repository = %ctx.session.local_repository.display(),
        "project loaded"
    );

    let resolver = LocalRepositoryResolver;
    let extractor = TimestampExtractor::new()
        .with_filesystem_fallback(ctx.config.extract.filesystem_fallback && !args.no_fallback);
    let sink = TracingSink;

    let fingerprints = FingerprintDetector::new(ctx.config.state_dir(&ctx.project_dir));
    let forced = args.force || ctx.config.gate.force;
    let detector: &dyn ChangeDetector = if forced { &AlwaysChanged } else { &fingerprints };

    let mut gate = BuildGate::new(
        GraphAdapter::new(&resolver),
        &extractor,
        AgeReporter::new(&sink),
    );
    let outcome = gate.run(&project, &ctx.session, detector)?;

    let report = match outcome {
        RunOutcome::Skipped => {
            debug!(project = %project.coordinates, "descriptor unchanged, skipping");
            ListReport {
                project: project.coordinates.to_string(),
                skipped: true,
                dated: 0,
                undated: 0,
                summary: RunSummary::default(),
            }
        }
        RunOutcome::Completed(summary) => {
            fingerprints.record(&project.descriptor_path)?;
            ListReport {
                project: project.coordinates.to_string(),
                skipped: false,
                dated: summary.dated(),
                undated: summary.undated(),
                summary,
            }
        }
    };

    if ctx.robot_mode {
        emit_robot(&robot_ok(report))?;
    }
    Ok(())
}
