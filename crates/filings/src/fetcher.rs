//! Per-entity document fetching into the staging tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use filings_core::{Archive, DocumentRequirement, DocumentType, Entity, FetchRequest, FilingsError};
use tokio::time::sleep;
use tracing::{debug, warn};

/// One requirement that could not be fetched.
#[derive(Debug)]
pub struct FetchFailure {
    /// Document type of the failed requirement.
    pub doc_type: DocumentType,
    /// Why the archive request failed.
    pub error: FilingsError,
}

/// Outcome of fetching every requirement for one entity.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Identifier the archive was queried with.
    pub archive_id: String,
    /// Bundles written or already present, per requirement.
    pub fetched: Vec<(DocumentType, usize)>,
    /// Requirements whose fetch failed.
    pub failures: Vec<FetchFailure>,
}

impl FetchReport {
    /// Returns true if no requirement failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetches the requirement menu for one entity.
///
/// Requirements are fetched one at a time, in declaration order, with a fixed
/// delay between requests. A failing requirement is recorded and the
/// remaining requirements are still fetched. There is no retry here.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    archive: Arc<dyn Archive>,
    staging_root: PathBuf,
    request_delay: Duration,
    include_details: bool,
}

impl DocumentFetcher {
    /// Create a fetcher writing below `staging_root`.
    #[must_use]
    pub fn new(archive: Arc<dyn Archive>, staging_root: impl Into<PathBuf>) -> Self {
        Self {
            archive,
            staging_root: staging_root.into(),
            request_delay: crate::config::REQUEST_DELAY,
            include_details: true,
        }
    }

    /// Set the delay between consecutive requests.
    #[must_use]
    pub const fn with_request_delay(mut self, request_delay: Duration) -> Self {
        self.request_delay = request_delay;
        self
    }

    /// Set whether bundles include the primary document.
    #[must_use]
    pub const fn with_details(mut self, include_details: bool) -> Self {
        self.include_details = include_details;
        self
    }

    /// Root of the staging tree.
    #[must_use]
    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Staging directory of an entity, keyed by its archive identifier.
    #[must_use]
    pub fn entity_dir(&self, entity: &Entity) -> PathBuf {
        self.staging_root.join(&entity.archive_id)
    }

    /// Fetch every requirement for `entity`.
    pub async fn fetch(&self, entity: &Entity, requirements: &[DocumentRequirement]) -> FetchReport {
        let mut report = FetchReport {
            archive_id: entity.archive_id.clone(),
            ..Default::default()
        };

        for (i, requirement) in requirements.iter().enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                sleep(self.request_delay).await;
            }

            let request = FetchRequest::new(
                requirement.doc_type,
                &entity.archive_id,
                requirement.expected_count,
            )
            .with_details(self.include_details);

            debug!(
                archive = self.archive.name(),
                entity = %entity,
                form = requirement.doc_type.form(),
                limit = requirement.expected_count,
                "Fetching filings"
            );

            match self.archive.fetch(&request, &self.staging_root).await {
                Ok(count) => report.fetched.push((requirement.doc_type, count)),
                Err(error) => {
                    warn!(
                        entity = %entity,
                        form = requirement.doc_type.form(),
                        error = %error,
                        "Fetch failed"
                    );
                    report.failures.push(FetchFailure {
                        doc_type: requirement.doc_type,
                        error,
                    });
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedArchive, quarterly_filings};
    use filings_core::Symbol;
    use tempfile::TempDir;

    fn menu() -> Vec<DocumentRequirement> {
        vec![
            DocumentRequirement::new(DocumentType::AnnualReport, 2),
            DocumentRequirement::new(DocumentType::QuarterlyReport, 8),
        ]
    }

    #[tokio::test]
    async fn test_fetch_writes_below_archive_id() {
        let dir = TempDir::new().unwrap();
        let archive = Arc::new(ScriptedArchive::xyz());
        let fetcher =
            DocumentFetcher::new(archive.clone(), dir.path()).with_request_delay(Duration::ZERO);

        let entity = Entity::new(Symbol::new("DFS")).with_archive_id("0001393612");
        let report = fetcher.fetch(&entity, &menu()).await;

        assert!(report.is_clean());
        assert_eq!(report.archive_id, "0001393612");
        assert_eq!(
            report.fetched,
            vec![
                (DocumentType::AnnualReport, 2),
                (DocumentType::QuarterlyReport, 8)
            ]
        );
        assert!(dir.path().join("0001393612").join("10-Q").is_dir());
        assert_eq!(fetcher.entity_dir(&entity), dir.path().join("0001393612"));
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_requirement() {
        let dir = TempDir::new().unwrap();
        let archive = Arc::new(
            ScriptedArchive::new()
                .with_filings(DocumentType::QuarterlyReport, quarterly_filings())
                .fail_calls(DocumentType::AnnualReport, 1),
        );
        let fetcher =
            DocumentFetcher::new(archive.clone(), dir.path()).with_request_delay(Duration::ZERO);

        let report = fetcher.fetch(&Entity::new(Symbol::new("XYZ")), &menu()).await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].doc_type, DocumentType::AnnualReport);
        assert!(matches!(report.failures[0].error, FilingsError::Network(_)));
        // The quarterly requirement still ran after the annual one failed
        assert_eq!(report.fetched, vec![(DocumentType::QuarterlyReport, 8)]);
        assert_eq!(archive.calls(), 2);
    }
}
