//! Speakerscript parsing.
//!
//! Speaker scripts place ambient sound emitters in the world; each
//! `noise "<path>"` line names a sound file. Trailing `//` comments are
//! common in hand-edited speaker scripts, so the in-line stripping variant
//! of the cleaner applies here.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{read_optional, ScriptError};
use crate::lines::{clean_lines, matches_keyword, nth_token, strip_comments, trim_quotes};

/// Sound cues extracted from a speakerscript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speakerscript {
    /// Absolute path of the script file; ships in the release.
    pub path: PathBuf,

    /// Sound file paths from `noise` lines.
    pub sounds: BTreeSet<String>,
}

/// Speaker scripts live under `sound/map/` in the mod root, keyed by the
/// map's base name with an `.sps` extension.
pub fn speakerscript_path(mod_root: &Path, map_name: &str) -> PathBuf {
    mod_root
        .join("sound")
        .join("map")
        .join(format!("{map_name}.sps"))
}

/// Parse the speakerscript belonging to a map, if one exists.
pub fn parse_speakerscript(
    mod_root: &Path,
    map_name: &str,
) -> Result<Option<Speakerscript>, ScriptError> {
    let path = speakerscript_path(mod_root, map_name);
    let Some(source) = read_optional(&path)? else {
        return Ok(None);
    };

    let mut script = Speakerscript {
        path,
        sounds: BTreeSet::new(),
    };

    for (line, _) in strip_comments(clean_lines(&source)) {
        if matches_keyword(line, "noise") {
            if let Some(cue) = nth_token(line, 1) {
                script.sounds.insert(trim_quotes(cue).to_string());
            }
        }
    }

    debug!(
        "speakerscript {}: {} noises",
        script.path.display(),
        script.sounds.len()
    );

    Ok(Some(script))
}
