//! Document type and requirement definitions.
//!
//! This module defines [`DocumentType`] for the filing forms the pipeline acquires
//! and [`DocumentRequirement`] for how many bundles of each form are expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FilingsError;

/// Regulatory filing type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentType {
    /// Annual report (form 10-K).
    AnnualReport,
    /// Quarterly report (form 10-Q).
    QuarterlyReport,
    /// Definitive proxy statement (form DEF 14A).
    ProxyStatement,
    /// Current report (form 8-K).
    CurrentReport,
}

impl DocumentType {
    /// All document types, in menu order.
    pub const ALL: [Self; 4] = [
        Self::AnnualReport,
        Self::QuarterlyReport,
        Self::ProxyStatement,
        Self::CurrentReport,
    ];

    /// Returns the archive form code (e.g., "10-K").
    ///
    /// The form code also names the type directory inside an entity's tree.
    #[must_use]
    pub const fn form(&self) -> &'static str {
        match self {
            Self::AnnualReport => "10-K",
            Self::QuarterlyReport => "10-Q",
            Self::ProxyStatement => "DEF 14A",
            Self::CurrentReport => "8-K",
        }
    }

    /// Returns the label used in canonical bundle names (e.g., "AnnualReport").
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AnnualReport => "AnnualReport",
            Self::QuarterlyReport => "QuarterlyReport",
            Self::ProxyStatement => "ProxyStatement",
            Self::CurrentReport => "CurrentReport",
        }
    }

    /// Looks up a document type by form code or label.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.form().eq_ignore_ascii_case(name) || t.label() == name)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentType {
    type Err = FilingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| FilingsError::InvalidParameter(format!("unknown document type: {s}")))
    }
}

/// How many bundles of one document type an entity is expected to have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRequirement {
    /// The filing type.
    pub doc_type: DocumentType,
    /// Exact number of most recent bundles to acquire.
    pub expected_count: usize,
}

impl DocumentRequirement {
    /// Creates a new requirement.
    #[must_use]
    pub const fn new(doc_type: DocumentType, expected_count: usize) -> Self {
        Self {
            doc_type,
            expected_count,
        }
    }
}

/// Default process-wide requirement menu, in declaration order.
///
/// Verification reports violations in this order.
pub const DEFAULT_REQUIREMENTS: [DocumentRequirement; 4] = [
    DocumentRequirement::new(DocumentType::AnnualReport, 2),
    DocumentRequirement::new(DocumentType::QuarterlyReport, 8),
    DocumentRequirement::new(DocumentType::ProxyStatement, 2),
    DocumentRequirement::new(DocumentType::CurrentReport, 8),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_codes() {
        assert_eq!(DocumentType::AnnualReport.form(), "10-K");
        assert_eq!(DocumentType::QuarterlyReport.form(), "10-Q");
        assert_eq!(DocumentType::ProxyStatement.form(), "DEF 14A");
        assert_eq!(DocumentType::CurrentReport.form(), "8-K");
    }

    #[test]
    fn test_parse_form_or_label() {
        assert_eq!(
            "10-Q".parse::<DocumentType>().unwrap(),
            DocumentType::QuarterlyReport
        );
        assert_eq!(
            "def 14a".parse::<DocumentType>().unwrap(),
            DocumentType::ProxyStatement
        );
        assert_eq!(
            "CurrentReport".parse::<DocumentType>().unwrap(),
            DocumentType::CurrentReport
        );
        assert!("10-K/A".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_default_menu() {
        let counts: Vec<_> = DEFAULT_REQUIREMENTS
            .iter()
            .map(|r| (r.doc_type.form(), r.expected_count))
            .collect();
        assert_eq!(
            counts,
            vec![("10-K", 2), ("10-Q", 8), ("DEF 14A", 2), ("8-K", 8)]
        );
    }
}
