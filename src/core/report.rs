//! Age report lines.

use tracing::{info, warn};

use crate::error::{DepageError, Result};

use super::model::{ExtractionOutcome, ResolvedDependency};

/// Destination of leveled report lines.
pub trait ReportSink {
    fn info(&self, line: &str);
    fn warn(&self, line: &str);
}

/// Emits report lines as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn info(&self, line: &str) {
        info!(target: "depage::report", "{line}");
    }

    fn warn(&self, line: &str) {
        warn!(target: "depage::report", "{line}");
    }
}

pub struct AgeReporter<'s> {
    sink: &'s dyn ReportSink,
}

impl<'s> AgeReporter<'s> {
    #[must_use]
    pub fn new(sink: &'s dyn ReportSink) -> Self {
        Self { sink }
    }

    /// One info line for a found date, one warning for a missing one.
    ///
    /// A failed outcome is handed back as an error without emitting
    /// anything.
    pub fn report(&self, dependency: &ResolvedDependency, outcome: ExtractionOutcome) -> Result<()> {
        match outcome {
            ExtractionOutcome::Found(created) => {
                self.sink.info(&format!(
                    "The creation date of: {} is: {}",
                    dependency.coordinates,
                    created.local_date()
                ));
                Ok(())
            }
            ExtractionOutcome::NotFound => {
                self.sink.warn(&format!(
                    "Could not determine age of: {}",
                    dependency.coordinates
                ));
                Ok(())
            }
            ExtractionOutcome::Failed(source) => Err(DepageError::ArchiveUnreadable {
                dependency: dependency.coordinates.to_string(),
                source,
            }),
        }
    }
}
