//! Map source parsing.
//!
//! A `.map` file is the uncompiled, line-oriented source of a level:
//! entities with quoted key/value pairs, brush geometry blocks and
//! `patchDef2` curved-surface blocks. Only the asset references matter here;
//! geometry itself is never validated.
//!
//! [`parse_map`] produces a [`MapDescriptor`]: the deduplicated shader,
//! model, sound and terrain references found in the source. The descriptor is
//! immutable once parsing completes; the resolver only reads from it.

mod parser;

pub use parser::{parse_map, parse_map_source};

use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Asset references extracted from one map source file.
///
/// All four sets are deduplicated by construction and iterate in a stable
/// order, so repeated resolution runs over an unchanged map yield identical
/// manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDescriptor {
    /// Map name (file stem, e.g. `goldrush`).
    pub name: String,

    /// Absolute path of the parsed `.map` file.
    pub path: PathBuf,

    /// Referenced shader names, including the implicit `textures/` prefix
    /// for brush and patch textures.
    pub shaders: BTreeSet<String>,

    /// Referenced model paths (`misc_gamemodel` entities and `model2` keys).
    pub models: BTreeSet<String>,

    /// Referenced sound cues (`noise` and `sound` keys).
    pub sounds: BTreeSet<String>,

    /// Terrain shader names.
    ///
    /// Terrains live in their own set because they are resolved by name
    /// prefix across all shader files, unlike ordinary shaders which are
    /// resolved first-match by exact name.
    pub terrains: BTreeSet<String>,
}

impl MapDescriptor {
    pub(crate) fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            shaders: BTreeSet::new(),
            models: BTreeSet::new(),
            sounds: BTreeSet::new(),
            terrains: BTreeSet::new(),
        }
    }
}

/// Errors that abort parsing of a map source file.
///
/// Any of these is fatal for the whole resolution run: a partial descriptor
/// is never handed to the resolver.
#[derive(Debug, Error)]
pub enum MapParseError {
    /// The map file could not be read.
    #[error("failed to read map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A structural token (usually `{`) was expected but something else
    /// followed.
    #[error("expecting `{expected}`, got `{found}` in {path} line {line}")]
    Expected {
        expected: String,
        found: String,
        path: PathBuf,
        line: usize,
    },

    /// A line at top level that is not an entity marker.
    #[error("unexpected token `{found}` in {path} line {line}")]
    UnexpectedToken {
        found: String,
        path: PathBuf,
        line: usize,
    },

    /// A brush face row with too few tokens to carry a texture name.
    #[error("brush face without a texture token in {path} line {line}")]
    MalformedBrushFace { path: PathBuf, line: usize },
}
