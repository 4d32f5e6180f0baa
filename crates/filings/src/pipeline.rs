//! Roster-level orchestration.

use std::collections::HashSet;
use std::sync::Arc;

use filings_core::{Archive, FilingsError, Result, Symbol};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::fetcher::DocumentFetcher;
use crate::namer;
use crate::packager;
use crate::resolver::EntityResolver;
use crate::retry::RetryController;
use crate::summary::RunSummary;
use crate::verifier::CompletenessVerifier;

/// Runs acquisition, verification, normalization and packaging for a roster.
///
/// Entities are processed one at a time. Per-entity, per-bundle and packaging
/// failures are collected into the [`RunSummary`]; only a failed startup
/// probe or an unusable staging root aborts the run.
///
/// # Example
///
/// ```rust,ignore
/// use filings::{Pipeline, PipelineConfig, Symbol};
///
/// let pipeline = Pipeline::edgar("MyApp/1.0 (contact@example.com)", PipelineConfig::default())?;
/// let summary = pipeline.run(&[Symbol::new("JPM"), Symbol::new("DFS")]).await?;
/// assert!(!summary.has_failures());
/// ```
pub struct Pipeline {
    archive: Arc<dyn Archive>,
    resolver: EntityResolver,
    config: PipelineConfig,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("archive", &self.archive.name())
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .finish()
    }
}

impl Pipeline {
    /// Create a pipeline over `archive` with the default override table.
    #[must_use]
    pub fn new(archive: Arc<dyn Archive>, config: PipelineConfig) -> Self {
        Self {
            archive,
            resolver: EntityResolver::default(),
            config,
        }
    }

    /// Create a pipeline over SEC EDGAR.
    #[cfg(feature = "edgar")]
    pub fn edgar(user_agent: &str, config: PipelineConfig) -> Result<Self> {
        let archive = filings_edgar::EdgarArchive::new(user_agent)?;
        Ok(Self::new(Arc::new(archive), config))
    }

    /// Replace the entity resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: EntityResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// The run configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole pipeline for `symbols`.
    ///
    /// Duplicate symbols are processed once, in first-seen order.
    pub async fn run(&self, symbols: &[Symbol]) -> Result<RunSummary> {
        if symbols.is_empty() {
            return Err(FilingsError::InvalidParameter("empty roster".to_string()));
        }

        self.archive.check_available().await.map_err(|e| {
            if e.is_fatal() {
                e
            } else {
                FilingsError::Configuration(format!("{} unavailable: {}", self.archive.name(), e))
            }
        })?;

        let root = &self.config.staging_root;
        std::fs::create_dir_all(root).map_err(|e| {
            FilingsError::Configuration(format!("cannot create {}: {}", root.display(), e))
        })?;

        let mut seen = HashSet::new();
        let entities: Vec<_> = symbols
            .iter()
            .filter(|s| seen.insert((*s).clone()))
            .map(|s| self.resolver.resolve(s))
            .collect();

        info!(
            archive = self.archive.name(),
            entities = entities.len(),
            root = %root.display(),
            "Starting run"
        );

        let fetcher = DocumentFetcher::new(self.archive.clone(), root.clone())
            .with_request_delay(self.config.request_delay)
            .with_details(self.config.include_details);
        let verifier = CompletenessVerifier::new(self.config.requirements.clone());
        let controller = RetryController::new(fetcher, verifier)
            .with_max_attempts(self.config.max_attempts)
            .with_backoff(self.config.retry_backoff);

        let mut summary = RunSummary::default();
        for entity in &entities {
            let outcome = controller.run(entity).await;
            summary.record_outcome(&outcome);
        }

        for entity in &entities {
            debug!(entity = %entity, "Normalizing");
            let report = namer::normalize_entity(root, entity);
            summary.record_renames(&entity.symbol, &report);
        }

        if let Some(zip_path) = &self.config.package_path {
            let data_dir = root.clone();
            let target = zip_path.clone();
            let packaged = tokio::task::spawn_blocking(move || packager::package(&data_dir, &target))
                .await
                .map_err(|e| FilingsError::Other(format!("packaging task failed: {e}")))
                .and_then(|result| result);
            match packaged {
                Ok(package) => summary.package = Some(package),
                Err(e) => {
                    summary.package_error = Some(format!("{}: {}", zip_path.display(), e));
                }
            }
        }

        summary.log();
        Ok(summary)
    }
}
