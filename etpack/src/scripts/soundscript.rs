//! Soundscript parsing.
//!
//! Soundscripts define named sound aliases; every `sound <path>` line names
//! a file the release must carry. Cue paths here are written without quotes,
//! so no quote stripping is applied.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{read_optional, ScriptError};
use crate::lines::{clean_lines, matches_keyword, nth_token, skip_comment_lines};

/// Sound cues extracted from a soundscript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soundscript {
    /// Absolute path of the script file; ships in the release.
    pub path: PathBuf,

    /// Sound file paths from `sound` lines.
    pub sounds: BTreeSet<String>,
}

/// Soundscripts live under `sound/scripts/` in the mod root, keyed by the
/// map's base name with a `.sounds` extension.
pub fn soundscript_path(mod_root: &Path, map_name: &str) -> PathBuf {
    mod_root
        .join("sound")
        .join("scripts")
        .join(format!("{map_name}.sounds"))
}

/// Parse the soundscript belonging to a map, if one exists.
pub fn parse_soundscript(
    mod_root: &Path,
    map_name: &str,
) -> Result<Option<Soundscript>, ScriptError> {
    let path = soundscript_path(mod_root, map_name);
    let Some(source) = read_optional(&path)? else {
        return Ok(None);
    };

    let mut script = Soundscript {
        path,
        sounds: BTreeSet::new(),
    };

    for (line, _) in skip_comment_lines(clean_lines(&source)) {
        if matches_keyword(line, "sound") {
            if let Some(cue) = nth_token(line, 1) {
                script.sounds.insert(cue.to_string());
            }
        }
    }

    debug!(
        "soundscript {}: {} sounds",
        script.path.display(),
        script.sounds.len()
    );

    Ok(Some(script))
}
