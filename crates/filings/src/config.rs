//! Static configuration for a pipeline run.

use std::path::PathBuf;
use std::time::Duration;

use filings_core::{DEFAULT_REQUIREMENTS, DocumentRequirement};

/// Maximum fetch attempts per entity, the first fetch included.
pub const MAX_ATTEMPTS: u32 = 5;

/// Fixed wait before re-fetching an incomplete entity.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Fixed wait between consecutive requirement fetches.
pub const REQUEST_DELAY: Duration = Duration::from_millis(150);

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Root of the staging tree; bundles are normalized in place.
    pub staging_root: PathBuf,
    /// Requirement menu, in declaration order.
    pub requirements: Vec<DocumentRequirement>,
    /// Fetch attempts per entity before it is a permanent failure.
    pub max_attempts: u32,
    /// Wait before each re-fetch.
    pub retry_backoff: Duration,
    /// Wait between consecutive requirement fetches.
    pub request_delay: Duration,
    /// Whether bundles include the primary document.
    pub include_details: bool,
    /// Destination of the zipped tree, if packaging is wanted.
    pub package_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            staging_root: PathBuf::from("data/sec_filings"),
            requirements: DEFAULT_REQUIREMENTS.to_vec(),
            max_attempts: MAX_ATTEMPTS,
            retry_backoff: RETRY_BACKOFF,
            request_delay: REQUEST_DELAY,
            include_details: true,
            package_path: None,
        }
    }
}

impl PipelineConfig {
    /// Create a config with defaults, staging below `staging_root`.
    #[must_use]
    pub fn new(staging_root: impl Into<PathBuf>) -> Self {
        Self {
            staging_root: staging_root.into(),
            ..Default::default()
        }
    }

    /// Set the requirement menu.
    #[must_use]
    pub fn with_requirements(mut self, requirements: Vec<DocumentRequirement>) -> Self {
        self.requirements = requirements;
        self
    }

    /// Set the maximum number of fetch attempts per entity.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the retry backoff and inter-request delay.
    #[must_use]
    pub const fn with_delays(mut self, retry_backoff: Duration, request_delay: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self.request_delay = request_delay;
        self
    }

    /// Set whether bundles include the primary document.
    #[must_use]
    pub const fn with_details(mut self, include_details: bool) -> Self {
        self.include_details = include_details;
        self
    }

    /// Zip the normalized tree to `path` at the end of the run.
    #[must_use]
    pub fn with_package(mut self, path: impl Into<PathBuf>) -> Self {
        self.package_path = Some(path.into());
        self
    }
}
