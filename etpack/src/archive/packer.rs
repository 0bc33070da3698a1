//! Archive-diff packaging: stage required files, write the release archive.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::BaseSnapshot;
use crate::resolver::ManifestEntry;

/// Candidate extensions for ambiguous (extension-less) asset references,
/// tried in this order on both the filesystem and the base snapshot.
const AMBIGUOUS_EXTENSIONS: [&str; 2] = ["tga", "jpg"];

/// Counts of how each manifest entry was handled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PackSummary {
    /// Files copied into the release archive.
    pub included: usize,

    /// Files skipped because the base install already ships them.
    pub skipped: usize,

    /// Files that could not be located by any resolution attempt.
    pub unresolved: usize,
}

/// Errors that are fatal for a whole pack run.
///
/// Per-file *resolution* failures are not errors — they are logged, counted
/// in [`PackSummary::unresolved`] and the run continues. Failing to copy a
/// resolved file or to write the archive leaves the output incomplete, so
/// those abort.
#[derive(Debug, Error)]
pub enum PackError {
    /// Could not create the temporary staging tree.
    #[error("failed to create staging directory: {0}")]
    Staging(#[source] io::Error),

    /// A resolved file could not be copied into the staging tree.
    #[error("failed to stage {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The staging tree could not be enumerated.
    #[error("failed to walk staging tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// The output archive could not be created or written.
    #[error("failed to write archive {path}: {message}")]
    Archive { path: PathBuf, message: String },
}

/// What to do with one manifest entry.
enum Disposition {
    Stage { source: PathBuf, target: String },
    Skip,
    Unresolved,
}

/// Diff the manifest against the base snapshot and write the release.
///
/// Files are staged into a fresh temporary tree that mirrors the archive
/// layout; the whole tree is then written into a single zip at `out_path`.
/// The staging tree is removed when the function returns.
pub fn pack_release(
    entries: &[ManifestEntry],
    snapshot: &BaseSnapshot,
    out_path: &Path,
) -> Result<PackSummary, PackError> {
    let staging = tempfile::tempdir().map_err(PackError::Staging)?;
    let mut summary = PackSummary::default();

    for entry in entries {
        match resolve_entry(entry, snapshot) {
            Disposition::Stage { source, target } => {
                stage_file(staging.path(), &source, &target)?;
                summary.included += 1;
            }
            Disposition::Skip => summary.skipped += 1,
            Disposition::Unresolved => summary.unresolved += 1,
        }
    }

    write_archive(staging.path(), out_path)?;
    info!(
        "wrote '{}': {} files packed, {} already in base archives, {} unresolved",
        out_path.display(),
        summary.included,
        summary.skipped,
        summary.unresolved
    );

    Ok(summary)
}

/// Per-entry inclusion policy.
///
/// 1. Exact target already in the base snapshot: skip.
/// 2. Source exists on disk as named: stage.
/// 3. Extension-less source: try a `.tga` sibling on disk, then `.tga` in
///    the snapshot, then the same for `.jpg` — disk always beats snapshot
///    within one extension, and tga candidates are exhausted before jpg.
/// 4. Otherwise report and count as unresolved.
fn resolve_entry(entry: &ManifestEntry, snapshot: &BaseSnapshot) -> Disposition {
    if snapshot.contains(&entry.target) {
        debug!(
            "skipping required file '{}', already in base archives",
            entry.target
        );
        return Disposition::Skip;
    }

    if entry.source.is_file() {
        return Disposition::Stage {
            source: entry.source.clone(),
            target: entry.target.clone(),
        };
    }

    if entry.source.extension().is_none() {
        for extension in AMBIGUOUS_EXTENSIONS {
            let sibling = entry.source.with_extension(extension);
            let target = format!("{}.{extension}", entry.target);
            if sibling.is_file() {
                debug!(
                    "using found {extension} version for ambiguous file '{}'",
                    entry.target
                );
                return Disposition::Stage {
                    source: sibling,
                    target,
                };
            }
            if snapshot.contains(&target) {
                debug!(
                    "ambiguous file '{}' satisfied by base archives as '{target}'",
                    entry.target
                );
                return Disposition::Skip;
            }
        }
    }

    error!("unresolved file '{}' ('{}')", entry.target, entry.source.display());
    Disposition::Unresolved
}

/// Copy one file into the staging tree, creating its directory chain.
fn stage_file(staging: &Path, source: &Path, target: &str) -> Result<(), PackError> {
    let mut dest = staging.to_path_buf();
    for part in target.split('/') {
        dest.push(part);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| PackError::Copy {
            path: source.to_path_buf(),
            source: e,
        })?;
    }
    fs::copy(source, &dest).map_err(|e| PackError::Copy {
        path: source.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Write the staged tree into a single deflate-compressed zip.
fn write_archive(staging: &Path, out_path: &Path) -> Result<(), PackError> {
    let archive_error = |e: &dyn std::fmt::Display| PackError::Archive {
        path: out_path.to_path_buf(),
        message: e.to_string(),
    };

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| archive_error(&e))?;
        }
    }

    let file = File::create(out_path).map_err(|e| archive_error(&e))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(staging).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(staging) else {
            continue;
        };
        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        writer.start_file(name, options).map_err(|e| archive_error(&e))?;
        let mut staged = File::open(entry.path()).map_err(|e| archive_error(&e))?;
        io::copy(&mut staged, &mut writer).map_err(|e| archive_error(&e))?;
    }

    let mut inner = writer.finish().map_err(|e| archive_error(&e))?;
    inner.flush().map_err(|e| archive_error(&e))?;
    Ok(())
}
