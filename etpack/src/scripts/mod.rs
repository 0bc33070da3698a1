//! Flat keyword-line script formats: mapscript, soundscript, speakerscript.
//!
//! All three share one shape: scan cleaned lines for a case-insensitive
//! keyword prefix and pull one whitespace-delimited token out of each match.
//! Each artifact lives at a fixed location derived from the map:
//!
//! | artifact      | location                               | extracts            |
//! |---------------|----------------------------------------|---------------------|
//! | mapscript     | `maps/<mapname>.script`                | sounds, remaps      |
//! | soundscript   | `sound/scripts/<mapname>.sounds`       | sounds              |
//! | speakerscript | `sound/map/<mapname>.sps`              | sounds              |
//!
//! Absence of a script file is normal (many maps ship without one) and is
//! reported as `Ok(None)` — distinct from a read failure, which is an error.

mod mapscript;
mod soundscript;
mod speakerscript;

pub use mapscript::{mapscript_path, parse_mapscript, Mapscript};
pub use soundscript::{parse_soundscript, soundscript_path, Soundscript};
pub use speakerscript::{parse_speakerscript, speakerscript_path, Speakerscript};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by the script parsers.
///
/// The flat formats have no structure to violate, so the only failure mode
/// is an unreadable file; a missing file is not an error.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script file exists but could not be read.
    #[error("failed to read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read a script file, mapping absence to `None`.
fn read_optional(path: &Path) -> Result<Option<String>, ScriptError> {
    if !path.is_file() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })
}
