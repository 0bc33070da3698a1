//! Read-only snapshot of the stock archives' contents.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{debug, error};
use zip::ZipArchive;

/// One file inside a base archive.
#[derive(Debug, Clone)]
pub struct BaseEntry {
    /// Archive-relative path, forward slashes.
    pub path: String,

    /// Uncompressed size in bytes.
    pub size: u64,

    /// Last-write timestamp recorded in the archive, when present.
    pub last_write: Option<zip::DateTime>,
}

/// Flattened entry lists of zero or more base archives.
///
/// Loaded once per run and never mutated afterwards; the packager only asks
/// it membership questions.
#[derive(Debug, Default)]
pub struct BaseSnapshot {
    entries: HashMap<String, BaseEntry>,
}

impl BaseSnapshot {
    /// A snapshot with no entries; every manifest file will be staged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from pre-made entries. Later duplicates of a path
    /// replace earlier ones, mirroring archive load order.
    pub fn from_entries(entries: impl IntoIterator<Item = BaseEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.path.clone(), entry))
                .collect(),
        }
    }

    /// Read and flatten the given archives.
    ///
    /// A missing or unreadable archive is reported and skipped; its entries
    /// are simply absent from the snapshot. This is deliberate: a damaged
    /// base install should degrade to over-packing, not abort the release.
    pub fn read<P: AsRef<Path>>(archives: &[P]) -> Self {
        let mut snapshot = Self::default();

        for path in archives {
            let path = path.as_ref();
            if !path.is_file() {
                error!("base archive not found '{}'", path.display());
                continue;
            }

            let file = match File::open(path) {
                Ok(file) => file,
                Err(e) => {
                    error!("failed to open base archive '{}': {e}", path.display());
                    continue;
                }
            };
            let mut archive = match ZipArchive::new(BufReader::new(file)) {
                Ok(archive) => archive,
                Err(e) => {
                    error!("failed to read base archive '{}': {e}", path.display());
                    continue;
                }
            };

            let mut count = 0usize;
            for index in 0..archive.len() {
                let entry = match archive.by_index(index) {
                    Ok(entry) => entry,
                    Err(e) => {
                        error!(
                            "failed to read entry {index} of '{}': {e}",
                            path.display()
                        );
                        continue;
                    }
                };
                if entry.is_dir() {
                    continue;
                }
                count += 1;
                snapshot.entries.insert(
                    entry.name().to_string(),
                    BaseEntry {
                        path: entry.name().to_string(),
                        size: entry.size(),
                        last_write: entry.last_modified(),
                    },
                );
            }
            debug!("found {count} files in '{}'", path.display());
        }

        snapshot
    }

    /// Whether the base install already contains `target`.
    pub fn contains(&self, target: &str) -> bool {
        self.entries.contains_key(target)
    }

    pub fn get(&self, target: &str) -> Option<&BaseEntry> {
        self.entries.get(target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
