//! Canonical renaming of staged bundles.
//!
//! Bundles are renamed in place to `{symbol}_{type}_{year}_Q{quarter}`. When
//! that name is taken, `_2`, `_3`, ... is appended. Type and bundle
//! directories are visited in sorted order, so the first bundle in listing
//! order claims the bare name and repeated runs are deterministic. Bundles
//! that already carry a canonical name are left alone.

use std::io;
use std::path::{Path, PathBuf};

use filings_core::{DocumentType, Entity, FilingsError, FiscalPeriod, Result, Symbol};
use tracing::{debug, info, warn};

use crate::fiscal;

/// A bundle that could not be renamed.
#[derive(Debug)]
pub struct BundleFailure {
    /// The bundle directory as it was found.
    pub bundle: PathBuf,
    /// Why it was not renamed.
    pub error: FilingsError,
}

/// Outcome of normalizing one entity.
#[derive(Debug, Default)]
pub struct RenameReport {
    /// Entity directory moved from its registry identifier to the symbol.
    pub restored: Option<(PathBuf, PathBuf)>,
    /// Renamed bundles, as (old path, new path).
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Bundles that were already canonically named.
    pub already_canonical: usize,
    /// Bundles whose fiscal period could not be read; left un-renamed.
    pub extraction_failures: Vec<BundleFailure>,
    /// Bundles whose rename failed.
    pub rename_failures: Vec<BundleFailure>,
}

/// Canonical bundle name: `{symbol}_{type}_{year}_Q{quarter}`.
#[must_use]
pub fn canonical_name(symbol: &Symbol, doc_type: DocumentType, period: &FiscalPeriod) -> String {
    format!(
        "{}_{}_{}_Q{}",
        symbol,
        doc_type.label(),
        period.year(),
        period.quarter()
    )
}

/// Returns true if `name` is a canonical name (with or without suffix).
#[must_use]
pub fn is_canonical(name: &str, symbol: &Symbol, doc_type: DocumentType) -> bool {
    let prefix = format!("{}_{}_", symbol, doc_type.label());
    let Some(rest) = name.strip_prefix(&prefix) else {
        return false;
    };

    let parts: Vec<&str> = rest.split('_').collect();
    let year_ok = |s: &str| s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit());
    let quarter_ok = |s: &str| matches!(s, "Q1" | "Q2" | "Q3" | "Q4");
    let suffix_ok = |s: &str| s.parse::<u32>().is_ok_and(|n| n >= 2) && !s.starts_with('0');

    match parts.as_slice() {
        [year, quarter] => year_ok(year) && quarter_ok(quarter),
        [year, quarter, suffix] => year_ok(year) && quarter_ok(quarter) && suffix_ok(suffix),
        _ => false,
    }
}

/// First free path for `name` inside `dir`: `name`, then `name_2`, `name_3`, ...
#[must_use]
pub fn free_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    (2u32..)
        .map(|n| dir.join(format!("{name}_{n}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Rename one bundle to its canonical name, resolving collisions.
pub fn rename(
    bundle_dir: &Path,
    symbol: &Symbol,
    doc_type: DocumentType,
    period: &FiscalPeriod,
) -> Result<PathBuf> {
    let parent = bundle_dir.parent().ok_or_else(|| {
        FilingsError::InvalidParameter(format!("bundle has no parent: {}", bundle_dir.display()))
    })?;

    let target = free_path(parent, &canonical_name(symbol, doc_type, period));
    std::fs::rename(bundle_dir, &target)
        .map_err(|e| FilingsError::Io(format!("{} -> {}: {}", bundle_dir.display(), target.display(), e)))?;
    Ok(target)
}

/// Normalize every staged bundle of `entity` below `root`.
///
/// A registry-keyed entity directory is first moved back to the symbol, so
/// the final tree is always symbol-keyed.
pub fn normalize_entity(root: &Path, entity: &Entity) -> RenameReport {
    let mut report = RenameReport::default();

    if let Err(e) = restore_symbol_dir(root, entity, &mut report) {
        report.rename_failures.push(BundleFailure {
            bundle: root.join(&entity.archive_id),
            error: e,
        });
    }

    let entity_dir = root.join(entity.symbol.as_str());
    if !entity_dir.is_dir() {
        debug!(entity = %entity, "Nothing staged, skipping rename");
        return report;
    }

    let type_dirs = match sorted_subdirs(&entity_dir) {
        Ok(dirs) => dirs,
        Err(e) => {
            report.rename_failures.push(BundleFailure {
                bundle: entity_dir,
                error: e.into(),
            });
            return report;
        }
    };

    for type_dir in type_dirs {
        let Some(doc_type) = dir_name(&type_dir).and_then(DocumentType::from_name) else {
            debug!(dir = %type_dir.display(), "Not a document type directory, skipping");
            continue;
        };
        normalize_type_dir(&type_dir, &entity.symbol, doc_type, &mut report);
    }

    info!(
        entity = %entity,
        renamed = report.renamed.len(),
        unchanged = report.already_canonical,
        failed = report.extraction_failures.len() + report.rename_failures.len(),
        "Normalized filings"
    );

    report
}

fn normalize_type_dir(
    type_dir: &Path,
    symbol: &Symbol,
    doc_type: DocumentType,
    report: &mut RenameReport,
) {
    let bundles = match sorted_subdirs(type_dir) {
        Ok(bundles) => bundles,
        Err(e) => {
            report.rename_failures.push(BundleFailure {
                bundle: type_dir.to_path_buf(),
                error: e.into(),
            });
            return;
        }
    };

    for bundle in bundles {
        if dir_name(&bundle).is_some_and(|name| is_canonical(name, symbol, doc_type)) {
            report.already_canonical += 1;
            continue;
        }

        let period = match fiscal::extract_period(&bundle) {
            Ok(period) => period,
            Err(error) => {
                warn!(bundle = %bundle.display(), error = %error, "Fiscal period unavailable, not renaming");
                report.extraction_failures.push(BundleFailure { bundle, error });
                continue;
            }
        };

        match rename(&bundle, symbol, doc_type, &period) {
            Ok(target) => {
                debug!(from = %bundle.display(), to = %target.display(), "Renamed bundle");
                report.renamed.push((bundle, target));
            }
            Err(error) => {
                warn!(bundle = %bundle.display(), error = %error, "Rename failed");
                report.rename_failures.push(BundleFailure { bundle, error });
            }
        }
    }
}

/// Move `root/{archive_id}` to `root/{symbol}`, merging into an existing
/// symbol directory type by type.
fn restore_symbol_dir(root: &Path, entity: &Entity, report: &mut RenameReport) -> Result<()> {
    if !entity.is_substituted() {
        return Ok(());
    }

    let staged = root.join(&entity.archive_id);
    if !staged.is_dir() {
        return Ok(());
    }

    let target = root.join(entity.symbol.as_str());
    if !target.exists() {
        std::fs::rename(&staged, &target)?;
        info!(from = %entity.archive_id, to = %entity.symbol, "Restored symbol directory");
        report.restored = Some((staged, target));
        return Ok(());
    }

    // Both exist: move type directories, or bundles into existing ones
    for type_dir in sorted_subdirs(&staged)? {
        let Some(name) = dir_name(&type_dir) else {
            continue;
        };
        let target_type = target.join(name);
        if !target_type.exists() {
            std::fs::rename(&type_dir, &target_type)?;
            continue;
        }
        for bundle in sorted_subdirs(&type_dir)? {
            let Some(bundle_name) = dir_name(&bundle) else {
                continue;
            };
            let moved = target_type.join(bundle_name);
            if moved.exists() {
                report.rename_failures.push(BundleFailure {
                    error: FilingsError::Io(format!("{} already exists", moved.display())),
                    bundle,
                });
                continue;
            }
            std::fs::rename(&bundle, &moved)?;
        }
        remove_if_empty(&type_dir);
    }
    remove_if_empty(&staged);

    info!(from = %entity.archive_id, to = %entity.symbol, "Merged into symbol directory");
    report.restored = Some((staged, target));
    Ok(())
}

/// Remove a merged-out directory; bundles left behind keep it in place.
fn remove_if_empty(dir: &Path) {
    if let Err(e) = std::fs::remove_dir(dir) {
        debug!(dir = %dir.display(), error = %e, "Directory left in place");
    }
}

fn dir_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn sorted_subdirs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}
