//! End of run reporting.

use std::path::PathBuf;

use filings_core::{DocumentType, Symbol};
use tracing::{error, info, warn};

use crate::namer::RenameReport;
use crate::packager::PackageSummary;
use crate::retry::EntityOutcome;

/// A failed archive request during one attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchFailureEntry {
    /// Entity symbol.
    pub symbol: Symbol,
    /// Attempt number, starting at 1.
    pub attempt: u32,
    /// Requirement that failed.
    pub doc_type: DocumentType,
    /// Error message.
    pub error: String,
}

/// An entity that never reached completeness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermanentFailure {
    /// Entity symbol.
    pub symbol: Symbol,
    /// Archive identifier the entity was fetched under.
    pub archive_id: String,
    /// Fetch attempts made.
    pub attempts: u32,
    /// Document type of the last violation, if known.
    pub last_failure: Option<DocumentType>,
    /// Last verification result.
    pub reason: String,
}

/// A bundle that was left un-renamed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleFailureEntry {
    /// Entity symbol.
    pub symbol: Symbol,
    /// Bundle directory.
    pub bundle: PathBuf,
    /// Error message.
    pub error: String,
}

/// Aggregated outcome of a pipeline run.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// Entities taken from the roster.
    pub entities_processed: usize,
    /// Entities that reached completeness.
    pub completed: Vec<Symbol>,
    /// Archive request failures, including those later recovered.
    pub fetch_failures: Vec<FetchFailureEntry>,
    /// Entities exhausted without reaching completeness.
    pub permanent_failures: Vec<PermanentFailure>,
    /// Bundles whose fiscal period could not be read.
    pub extraction_failures: Vec<BundleFailureEntry>,
    /// Bundles whose rename failed.
    pub rename_failures: Vec<BundleFailureEntry>,
    /// Bundles renamed in this run.
    pub renamed: usize,
    /// Bundles already carrying a canonical name.
    pub already_canonical: usize,
    /// Package written at the end, if any.
    pub package: Option<PackageSummary>,
    /// Why the package could not be written, if packaging was requested and failed.
    pub package_error: Option<String>,
}

impl RunSummary {
    /// Fold the retry outcome of one entity into the summary.
    pub fn record_outcome(&mut self, outcome: &EntityOutcome) {
        self.entities_processed += 1;

        for (attempt, report) in (1u32..).zip(&outcome.fetch_reports) {
            for failure in &report.failures {
                self.fetch_failures.push(FetchFailureEntry {
                    symbol: outcome.entity.symbol.clone(),
                    attempt,
                    doc_type: failure.doc_type,
                    error: failure.error.to_string(),
                });
            }
        }

        if outcome.is_complete() {
            self.completed.push(outcome.entity.symbol.clone());
        } else {
            self.permanent_failures.push(PermanentFailure {
                symbol: outcome.entity.symbol.clone(),
                archive_id: outcome.entity.archive_id.clone(),
                attempts: outcome.state.attempts_made,
                last_failure: outcome.state.last_failure,
                reason: outcome.verification.to_string(),
            });
        }
    }

    /// Fold the rename report of one entity into the summary.
    pub fn record_renames(&mut self, symbol: &Symbol, report: &RenameReport) {
        self.renamed += report.renamed.len();
        self.already_canonical += report.already_canonical;

        let entries = |failures: &[crate::namer::BundleFailure]| {
            failures
                .iter()
                .map(|f| BundleFailureEntry {
                    symbol: symbol.clone(),
                    bundle: f.bundle.clone(),
                    error: f.error.to_string(),
                })
                .collect::<Vec<_>>()
        };
        self.extraction_failures
            .extend(entries(&report.extraction_failures));
        self.rename_failures.extend(entries(&report.rename_failures));
    }

    /// Returns true if any entity or bundle needs manual attention.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.permanent_failures.is_empty()
            || !self.extraction_failures.is_empty()
            || !self.rename_failures.is_empty()
            || self.package_error.is_some()
    }

    /// Log the summary, one event per failure.
    pub fn log(&self) {
        info!(
            entities = self.entities_processed,
            complete = self.completed.len(),
            incomplete = self.permanent_failures.len(),
            renamed = self.renamed,
            unchanged = self.already_canonical,
            "Run finished"
        );

        for f in &self.fetch_failures {
            warn!(
                symbol = %f.symbol,
                attempt = f.attempt,
                form = f.doc_type.form(),
                error = %f.error,
                "Fetch failure"
            );
        }
        for f in &self.permanent_failures {
            error!(
                symbol = %f.symbol,
                archive_id = %f.archive_id,
                attempts = f.attempts,
                last_failure = ?f.last_failure,
                reason = %f.reason,
                "Permanent failure, manual intervention needed"
            );
        }
        for f in &self.extraction_failures {
            error!(
                symbol = %f.symbol,
                bundle = %f.bundle.display(),
                error = %f.error,
                "Fiscal period extraction failed"
            );
        }
        for f in &self.rename_failures {
            error!(
                symbol = %f.symbol,
                bundle = %f.bundle.display(),
                error = %f.error,
                "Rename failed"
            );
        }

        if let Some(package) = &self.package {
            info!(
                path = %package.path.display(),
                files = package.files,
                bytes = package.bytes,
                "Package written"
            );
        }
        if let Some(e) = &self.package_error {
            error!(error = %e, "Packaging failed");
        }
    }
}
