//! Zip packaging of the normalized tree.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use filings_core::{FilingsError, Result};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// What went into a package.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageSummary {
    /// Path of the written archive.
    pub path: PathBuf,
    /// Number of files stored.
    pub files: usize,
    /// Uncompressed bytes stored.
    pub bytes: u64,
}

/// Package every file below `data_dir` into `zip_path`.
///
/// Entry names are relative to the parent of `data_dir`, so the archive
/// unpacks to a single top-level directory. The archive itself is skipped
/// when it lies inside `data_dir`.
pub fn package(data_dir: &Path, zip_path: &Path) -> Result<PackageSummary> {
    if !data_dir.is_dir() {
        return Err(FilingsError::InvalidParameter(format!(
            "not a directory: {}",
            data_dir.display()
        )));
    }

    let base = data_dir.parent().unwrap_or_else(|| Path::new(""));
    let files = walk_files(data_dir)?;

    if let Some(parent) = zip_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let out = File::create(zip_path)?;
    let mut zip = ZipWriter::new(BufWriter::new(out));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let skip = zip_path.canonicalize().ok();
    let mut summary = PackageSummary {
        path: zip_path.to_path_buf(),
        ..PackageSummary::default()
    };

    for path in files {
        if skip.is_some() && path.canonicalize().ok() == skip {
            continue;
        }
        let name = entry_name(&path, base)?;
        zip.start_file(name, options).map_err(zip_error)?;
        let mut input = File::open(&path)?;
        summary.bytes += io::copy(&mut input, &mut zip)?;
        summary.files += 1;
    }

    zip.finish().map_err(zip_error)?;

    info!(
        path = %zip_path.display(),
        files = summary.files,
        bytes = summary.bytes,
        "Packaged filings"
    );

    Ok(summary)
}

fn zip_error(e: zip::result::ZipError) -> FilingsError {
    FilingsError::Io(e.to_string())
}

/// Archive entry name with `/` separators.
fn entry_name(path: &Path, base: &Path) -> Result<String> {
    let relative = path.strip_prefix(base).map_err(|_| {
        FilingsError::InvalidParameter(format!("{} is outside {}", path.display(), base.display()))
    })?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

fn walk_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()?;
    entries.sort();

    let mut files = Vec::new();
    for path in entries {
        if path.is_dir() {
            files.extend(walk_files(&path)?);
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}
