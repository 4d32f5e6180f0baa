#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for regulatory filing acquisition.
//!
//! This crate provides the foundational abstractions shared by the archive
//! backends and the acquisition pipeline:
//!
//! - [`Archive`](archive::Archive) - Opaque fetch service for filing bundles
//! - [`DocumentType`](document::DocumentType) - Filing types the pipeline acquires
//! - [`DocumentRequirement`](document::DocumentRequirement) - Expected bundle counts
//! - [`FiscalPeriod`](types::FiscalPeriod) - Fiscal quarter derivation

/// Archive trait and fetch request types.
pub mod archive;
/// Document types and the requirement menu.
pub mod document;
/// Error types for filing operations.
pub mod error;
/// Core data types (Symbol, Entity, FiscalPeriod).
pub mod types;

// Re-export commonly used items at crate root
pub use archive::{Archive, FetchRequest};
pub use document::{DEFAULT_REQUIREMENTS, DocumentRequirement, DocumentType};
pub use error::{FilingsError, Result};
pub use types::{Entity, FiscalPeriod, Symbol};
