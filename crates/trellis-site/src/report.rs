//! Per-run summary of generated artifacts and isolated failures

use std::path::PathBuf;

use serde::Serialize;
use trellis_core::GenerationError;

use crate::writer::WriteOutcome;

/// A failure that skipped one source or one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub source: PathBuf,
    /// `None` when the whole source was skipped.
    pub artifact: Option<PathBuf>,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub sources: usize,
    /// Paths written this run, in write order.
    pub written: Vec<PathBuf>,
    /// Number of written paths that did not exist before.
    pub created: usize,
    pub skipped: usize,
    pub failures: Vec<Failure>,
}

impl RunReport {
    pub fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Skipped(_) => self.skipped += 1,
            WriteOutcome::Written { path, created, .. } => {
                if created {
                    self.created += 1;
                }
                self.written.push(path);
            }
        }
    }

    pub fn fail(&mut self, source: PathBuf, artifact: Option<PathBuf>, error: &GenerationError) {
        self.failures.push(Failure {
            source,
            artifact,
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    pub fn writes(&self) -> usize {
        self.written.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "{} sources: {} written ({} new), {} current, {} failed",
            self.sources,
            self.writes(),
            self.created,
            self.skipped,
            self.failures.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freshness::Freshness;

    #[test]
    fn records_outcomes_and_failures() {
        let mut report = RunReport {
            sources: 1,
            ..RunReport::default()
        };
        report.record(WriteOutcome::Written {
            path: PathBuf::from("index.json"),
            created: true,
            reason: Freshness::Missing,
        });
        report.record(WriteOutcome::Skipped(Freshness::Current));
        report.fail(
            PathBuf::from("a.model.json"),
            None,
            &GenerationError::SourceUnavailable {
                reason: "gone".to_string(),
            },
        );

        assert_eq!(report.writes(), 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 1);
        assert!(!report.is_success());
        assert_eq!(
            report.summary(),
            "1 sources: 1 written (1 new), 1 current, 1 failed"
        );
    }
}
