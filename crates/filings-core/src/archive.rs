//! Archive trait for fetching filing bundles.
//!
//! The archive is the remote document source of record. Implementations write
//! raw bundles below a caller-specified root using the layout
//! `root/{identifier}/{form}/{accession}/...files`.

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;

use crate::{document::DocumentType, error::Result};

/// One fetch request against an archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchRequest<'a> {
    /// Filing type to fetch.
    pub doc_type: DocumentType,
    /// Ticker or registry identifier the archive is queried with.
    pub identifier: &'a str,
    /// Maximum number of most recent bundles to write.
    pub limit: usize,
    /// Whether to also write the primary document next to the full submission.
    pub include_details: bool,
}

impl<'a> FetchRequest<'a> {
    /// Creates a request for the `limit` most recent bundles, with details.
    #[must_use]
    pub const fn new(doc_type: DocumentType, identifier: &'a str, limit: usize) -> Self {
        Self {
            doc_type,
            identifier,
            limit,
            include_details: true,
        }
    }

    /// Sets whether the primary document is downloaded.
    #[must_use]
    pub const fn with_details(mut self, include_details: bool) -> Self {
        self.include_details = include_details;
        self
    }
}

/// Remote filing archive.
///
/// Implementations must never have two requests in flight at once and must
/// enforce a minimum delay between consecutive requests.
#[async_trait]
pub trait Archive: Send + Sync + Debug {
    /// Returns the name of this archive (e.g., "SEC EDGAR").
    fn name(&self) -> &str;

    /// Checks that the archive is reachable before a run starts.
    ///
    /// A failure here is fatal for the run. The default implementation
    /// always succeeds.
    async fn check_available(&self) -> Result<()> {
        Ok(())
    }

    /// Fetches bundles for one request, writing them below `root`.
    ///
    /// Returns the number of bundles written or already present.
    async fn fetch(&self, request: &FetchRequest<'_>, root: &Path) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_to_details() {
        let request = FetchRequest::new(DocumentType::AnnualReport, "JPM", 2);
        assert!(request.include_details);
        assert!(!request.with_details(false).include_details);
    }
}
