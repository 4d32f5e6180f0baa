#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Acquisition pipeline for regulatory filings.
//!
//! This crate re-exports the core types and the archive backends, and
//! provides the stages of the pipeline plus a [`Pipeline`] that runs them in
//! order for a roster of entities.
//!
//! # Features
//!
//! - `edgar` - SEC EDGAR archive backend and the `filings` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use filings::{Pipeline, PipelineConfig, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> filings::Result<()> {
//!     let config = PipelineConfig::new("data/sec_filings").with_package("data.zip");
//!     let pipeline = Pipeline::edgar("MyApp/1.0 (contact@example.com)", config)?;
//!
//!     let summary = pipeline.run(&[Symbol::new("JPM"), Symbol::new("DFS")]).await?;
//!     println!("{} complete", summary.completed.len());
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use filings_core::*;

// Archives
#[cfg(feature = "edgar")]
pub use filings_edgar::EdgarArchive;

/// Run configuration and static defaults.
pub mod config;
/// Per-entity document fetching.
pub mod fetcher;
/// Fiscal period extraction from submission headers.
pub mod fiscal;
/// Canonical renaming of staged bundles.
pub mod namer;
/// Zip packaging of the normalized tree.
pub mod packager;
/// Roster-level orchestration.
pub mod pipeline;
/// Ticker to archive identifier resolution.
pub mod resolver;
/// Bounded retry of incomplete entities.
pub mod retry;
/// End of run reporting.
pub mod summary;
/// Completeness verification of staged trees.
pub mod verifier;

#[cfg(test)]
mod testing;

pub use config::PipelineConfig;
pub use fetcher::{DocumentFetcher, FetchReport};
pub use pipeline::Pipeline;
pub use resolver::EntityResolver;
pub use retry::{EntityOutcome, RetryController, RetryState};
pub use summary::RunSummary;
pub use verifier::{CompletenessVerifier, Verification};
