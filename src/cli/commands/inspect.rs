//! depage inspect - show what each extraction tier sees in one archive

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::archive::{
    ArchiveError, ArchiveFs, EntryAttributes, EntryIndex, MANIFEST_PATH, ZipEntryIndex,
};
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::core::{ExtractionOutcome, TimestampExtractor};
use crate::error::{DepageError, Result};
use crate::utils::resolve_against;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Archive to inspect
    pub archive: PathBuf,

    /// Only read the manifest's creation time from the archive index
    #[arg(long)]
    pub no_fallback: bool,
}

#[derive(Serialize)]
struct Inspection {
    archive: PathBuf,
    index_created: Option<DateTime<Utc>>,
    manifest: Option<EntryAttributes>,
    created: Option<NaiveDate>,
}

pub fn run(ctx: &AppContext, args: &InspectArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let archive = resolve_against(&cwd, &args.archive);
    let unreadable = |source: ArchiveError| DepageError::ArchiveUnreadable {
        dependency: archive.display().to_string(),
        source,
    };

    let extractor = TimestampExtractor::new()
        .with_filesystem_fallback(ctx.config.extract.filesystem_fallback && !args.no_fallback);
    let created = match extractor.extract_archive(&archive) {
        ExtractionOutcome::Found(created) => Some(created.local_date()),
        ExtractionOutcome::NotFound => None,
        ExtractionOutcome::Failed(source) => return Err(unreadable(source)),
    };

    let index_created = ZipEntryIndex
        .entry_creation_time(&archive, MANIFEST_PATH)
        .map_err(unreadable)?;
    let manifest = ArchiveFs::mount(&archive)
        .and_then(|mut fs| fs.metadata(MANIFEST_PATH))
        .map_err(unreadable)?;

    let inspection = Inspection {
        archive,
        index_created,
        manifest,
        created,
    };

    if ctx.robot_mode {
        emit_robot(&robot_ok(inspection))
    } else {
        emit_human(render(&inspection));
        Ok(())
    }
}

fn render(inspection: &Inspection) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .title(&inspection.archive.display().to_string())
        .kv("Index", &show_time(inspection.index_created));
    match &inspection.manifest {
        Some(attributes) => {
            layout
                .kv("Created", &show_time(attributes.created))
                .kv("Modified", &show_time(attributes.modified))
                .kv("Size", &attributes.size.to_string());
        }
        None => {
            layout.kv("Manifest", "absent");
        }
    }
    layout.kv(
        "Age",
        &inspection
            .created
            .map_or_else(|| "undetermined".to_string(), |date| date.to_string()),
    );
    layout
}

fn show_time(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| "-".to_string(), |instant| instant.to_rfc3339())
}
