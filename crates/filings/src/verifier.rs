//! Completeness verification of a staged entity tree.
//!
//! An entity is complete when, for every requirement, its type directory
//! holds exactly `expected_count` bundle directories and every file inside
//! them is non-empty. More bundles than expected is a failure too: it means a
//! previous partial run left stale bundles behind.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use filings_core::{DocumentRequirement, DocumentType};

/// Why one requirement is not satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// The type directory does not exist.
    MissingType,
    /// The number of bundles differs from the requirement.
    CountMismatch {
        /// Bundles required.
        expected: usize,
        /// Bundles found.
        actual: usize,
    },
    /// A bundle contains a zero-length file.
    EmptyFile(PathBuf),
    /// The tree could not be read.
    Unreadable(String),
}

/// First unsatisfied requirement of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Document type of the unsatisfied requirement.
    pub doc_type: DocumentType,
    /// What is wrong with it.
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let form = self.doc_type.form();
        match &self.kind {
            ViolationKind::MissingType => write!(f, "{form}: no filings directory"),
            ViolationKind::CountMismatch { expected, actual } => {
                write!(f, "{form}: expected {expected} bundles, found {actual}")
            }
            ViolationKind::EmptyFile(path) => write!(f, "{form}: empty file {}", path.display()),
            ViolationKind::Unreadable(e) => write!(f, "{form}: unreadable ({e})"),
        }
    }
}

/// Result of verifying one staged entity directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Every requirement is satisfied.
    Complete,
    /// The entity directory does not exist yet.
    NotYetFetched {
        /// Identifier the directory is keyed by.
        entity: String,
    },
    /// At least one requirement is unsatisfied; only the first is reported.
    Incomplete {
        /// Identifier the directory is keyed by.
        entity: String,
        /// First violation in requirement order.
        violation: Violation,
    },
}

impl Verification {
    /// Returns true if every requirement is satisfied.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// The failing entity identifier, or `None` when complete.
    #[must_use]
    pub fn failing_entity(&self) -> Option<&str> {
        match self {
            Self::Complete => None,
            Self::NotYetFetched { entity } | Self::Incomplete { entity, .. } => Some(entity.as_str()),
        }
    }

    /// The first violation, if the entity was fetched but is incomplete.
    #[must_use]
    pub const fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Incomplete { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => f.write_str("complete"),
            Self::NotYetFetched { entity } => write!(f, "{entity}: not yet fetched"),
            Self::Incomplete { entity, violation } => write!(f, "{entity}: {violation}"),
        }
    }
}

/// Per (entity, document type) completeness, recomputed on every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletenessRecord {
    /// Document type inspected.
    pub doc_type: DocumentType,
    /// Bundles required.
    pub expected_count: usize,
    /// Bundles found, `None` when the type directory is missing.
    pub actual_count: Option<usize>,
    /// First zero-length file found, if any.
    pub empty_file: Option<PathBuf>,
    /// Read error, if the tree could not be walked.
    pub error: Option<String>,
}

impl CompletenessRecord {
    /// The violation this record represents, if any.
    #[must_use]
    pub fn violation(&self) -> Option<ViolationKind> {
        if let Some(e) = &self.error {
            return Some(ViolationKind::Unreadable(e.clone()));
        }
        match self.actual_count {
            None => Some(ViolationKind::MissingType),
            Some(actual) if actual != self.expected_count => Some(ViolationKind::CountMismatch {
                expected: self.expected_count,
                actual,
            }),
            Some(_) => self.empty_file.clone().map(ViolationKind::EmptyFile),
        }
    }

    /// Returns true if the requirement is satisfied.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violation().is_none()
    }
}

/// Checks staged entity trees against the requirement menu.
#[derive(Debug, Clone)]
pub struct CompletenessVerifier {
    requirements: Vec<DocumentRequirement>,
}

impl CompletenessVerifier {
    /// Create a verifier for a requirement menu.
    #[must_use]
    pub const fn new(requirements: Vec<DocumentRequirement>) -> Self {
        Self { requirements }
    }

    /// The requirement menu, in declaration order.
    #[must_use]
    pub fn requirements(&self) -> &[DocumentRequirement] {
        &self.requirements
    }

    /// Verify a staged entity directory, stopping at the first violation.
    #[must_use]
    pub fn verify(&self, entity_dir: &Path) -> Verification {
        let entity = entity_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !entity_dir.is_dir() {
            return Verification::NotYetFetched { entity };
        }

        for requirement in &self.requirements {
            let record = self.inspect(entity_dir, requirement);
            if let Some(kind) = record.violation() {
                return Verification::Incomplete {
                    entity,
                    violation: Violation {
                        doc_type: requirement.doc_type,
                        kind,
                    },
                };
            }
        }

        Verification::Complete
    }

    /// Compute the completeness record of one requirement.
    #[must_use]
    pub fn inspect(&self, entity_dir: &Path, requirement: &DocumentRequirement) -> CompletenessRecord {
        let mut record = CompletenessRecord {
            doc_type: requirement.doc_type,
            expected_count: requirement.expected_count,
            actual_count: None,
            empty_file: None,
            error: None,
        };

        let type_dir = entity_dir.join(requirement.doc_type.form());
        if !type_dir.is_dir() {
            return record;
        }

        let bundles = match bundle_dirs(&type_dir) {
            Ok(bundles) => bundles,
            Err(e) => {
                record.error = Some(e.to_string());
                return record;
            }
        };
        record.actual_count = Some(bundles.len());
        if bundles.len() != requirement.expected_count {
            return record;
        }

        for bundle in &bundles {
            match first_empty_file(bundle) {
                Ok(None) => {}
                Ok(Some(path)) => {
                    record.empty_file = Some(path);
                    break;
                }
                Err(e) => {
                    record.error = Some(e.to_string());
                    break;
                }
            }
        }

        record
    }
}

/// Bundle subdirectories of a type directory, sorted by name.
fn bundle_dirs(type_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(type_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Depth-first search for a zero-length file.
fn first_empty_file(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if let Some(found) = first_empty_file(&path)? {
                return Ok(Some(found));
            }
        } else if file_type.is_file() && entry.metadata()?.len() == 0 {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_bundle;
    use tempfile::TempDir;

    fn menu() -> Vec<DocumentRequirement> {
        vec![
            DocumentRequirement::new(DocumentType::AnnualReport, 2),
            DocumentRequirement::new(DocumentType::QuarterlyReport, 3),
        ]
    }

    /// Stage `annual` 10-K and `quarterly` 10-Q bundles under `root/XYZ`.
    fn stage(root: &Path, annual: usize, quarterly: usize) -> PathBuf {
        let entity_dir = root.join("XYZ");
        for i in 0..annual {
            write_bundle(
                &entity_dir.join("10-K"),
                &format!("0000012345-2{i}-000001"),
                "10-K",
                Some("20241231"),
                Some("1231"),
            );
        }
        for i in 0..quarterly {
            write_bundle(
                &entity_dir.join("10-Q"),
                &format!("0000012345-2{i}-000002"),
                "10-Q",
                Some("20240930"),
                Some("1231"),
            );
        }
        entity_dir
    }

    #[test]
    fn test_complete_tree() {
        let dir = TempDir::new().unwrap();
        let entity_dir = stage(dir.path(), 2, 3);

        let verification = CompletenessVerifier::new(menu()).verify(&entity_dir);
        assert!(verification.is_complete());
        assert_eq!(verification.failing_entity(), None);
    }

    #[test]
    fn test_empty_file_fails_entity() {
        let dir = TempDir::new().unwrap();
        let entity_dir = stage(dir.path(), 2, 3);
        let victim = entity_dir
            .join("10-Q")
            .join("0000012345-21-000002")
            .join("primary-document.htm");
        std::fs::write(&victim, b"").unwrap();

        let verification = CompletenessVerifier::new(menu()).verify(&entity_dir);
        assert_eq!(verification.failing_entity(), Some("XYZ"));
        assert_eq!(
            verification.violation().unwrap().kind,
            ViolationKind::EmptyFile(victim)
        );
    }

    #[test]
    fn test_empty_file_in_nested_directory() {
        let dir = TempDir::new().unwrap();
        let entity_dir = stage(dir.path(), 2, 3);
        let nested = entity_dir.join("10-K").join("0000012345-20-000001").join("exhibits");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("ex21.htm"), b"").unwrap();

        let verification = CompletenessVerifier::new(menu()).verify(&entity_dir);
        assert!(matches!(
            verification.violation().unwrap().kind,
            ViolationKind::EmptyFile(_)
        ));
    }

    #[test]
    fn test_undershoot_and_overshoot_both_fail() {
        let dir = TempDir::new().unwrap();
        let under = stage(&dir.path().join("under"), 2, 2);
        let over = stage(&dir.path().join("over"), 2, 4);
        let verifier = CompletenessVerifier::new(menu());

        assert_eq!(
            verifier.verify(&under).violation().unwrap().kind,
            ViolationKind::CountMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(
            verifier.verify(&over).violation().unwrap().kind,
            ViolationKind::CountMismatch {
                expected: 3,
                actual: 4
            }
        );
    }

    #[test]
    fn test_first_violation_in_declaration_order() {
        let dir = TempDir::new().unwrap();
        // Both requirements are violated; the 10-K comes first in the menu
        let entity_dir = stage(dir.path(), 1, 0);

        let verification = CompletenessVerifier::new(menu()).verify(&entity_dir);
        let violation = verification.violation().unwrap();
        assert_eq!(violation.doc_type, DocumentType::AnnualReport);
        assert_eq!(
            violation.kind,
            ViolationKind::CountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_missing_type_directory() {
        let dir = TempDir::new().unwrap();
        let entity_dir = stage(dir.path(), 2, 0);

        let verification = CompletenessVerifier::new(menu()).verify(&entity_dir);
        let violation = verification.violation().unwrap();
        assert_eq!(violation.doc_type, DocumentType::QuarterlyReport);
        assert_eq!(violation.kind, ViolationKind::MissingType);
    }

    #[test]
    fn test_not_yet_fetched_is_distinct() {
        let dir = TempDir::new().unwrap();
        let verification = CompletenessVerifier::new(menu()).verify(&dir.path().join("XYZ"));

        assert_eq!(
            verification,
            Verification::NotYetFetched {
                entity: "XYZ".to_string()
            }
        );
        assert_eq!(verification.failing_entity(), Some("XYZ"));
        assert!(verification.violation().is_none());
    }

    #[test]
    fn test_stray_files_are_not_bundles() {
        let dir = TempDir::new().unwrap();
        let entity_dir = stage(dir.path(), 2, 3);
        std::fs::write(entity_dir.join("10-K").join(".DS_Store"), b"x").unwrap();

        assert!(CompletenessVerifier::new(menu()).verify(&entity_dir).is_complete());
    }

    #[test]
    fn test_record_counts() {
        let dir = TempDir::new().unwrap();
        let entity_dir = stage(dir.path(), 2, 1);
        let verifier = CompletenessVerifier::new(menu());

        let record = verifier.inspect(&entity_dir, &verifier.requirements()[1]);
        assert_eq!(record.actual_count, Some(1));
        assert_eq!(record.expected_count, 3);
        assert!(!record.is_valid());
    }
}
