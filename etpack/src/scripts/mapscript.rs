//! Mapscript parsing.
//!
//! The mapscript drives scripted events and can both play sounds
//! (`playsound <cue>`) and swap shaders at runtime
//! (`remapshader <from> <to>`); the remap *target* is a shader reference the
//! release must satisfy.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{read_optional, ScriptError};
use crate::lines::{clean_lines, matches_keyword, nth_token, skip_comment_lines, trim_quotes};

/// Sound cues and shader remap targets extracted from a mapscript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapscript {
    /// Absolute path of the script file; ships in the release.
    pub path: PathBuf,

    /// Sound cue paths from `playsound` lines.
    pub sounds: BTreeSet<String>,

    /// Shader remap targets from `remapshader` lines.
    pub remaps: BTreeSet<String>,
}

/// The mapscript shares the map's directory and base name, with the
/// `script` extension.
pub fn mapscript_path(map_path: &Path) -> PathBuf {
    map_path.with_extension("script")
}

/// Parse the mapscript belonging to a map, if one exists.
pub fn parse_mapscript(map_path: &Path) -> Result<Option<Mapscript>, ScriptError> {
    let path = mapscript_path(map_path);
    let Some(source) = read_optional(&path)? else {
        return Ok(None);
    };

    let mut script = Mapscript {
        path,
        sounds: BTreeSet::new(),
        remaps: BTreeSet::new(),
    };

    for (line, _) in skip_comment_lines(clean_lines(&source)) {
        if matches_keyword(line, "remapshader") {
            if let Some(target) = nth_token(line, 2) {
                script.remaps.insert(trim_quotes(target).to_string());
            }
        } else if matches_keyword(line, "playsound") {
            if let Some(cue) = nth_token(line, 1) {
                script.sounds.insert(trim_quotes(cue).to_string());
            }
        }
    }

    debug!(
        "mapscript {}: {} sounds, {} remaps",
        script.path.display(),
        script.sounds.len(),
        script.remaps.len()
    );

    Ok(Some(script))
}
