//! Shader definition parsing and lookup.
//!
//! Shader files (`scripts/*.shader`) name surface materials and list the
//! image or video files each one renders. This module parses them just deep
//! enough to recover those file references; rendering semantics are out of
//! scope.
//!
//! The directory driver [`read_shader_dir`] enumerates `*.shader` files in
//! sorted path order. That order is load-bearing: ordinary shader references
//! are resolved first-match (see [`required_files`]), so the enumeration
//! order decides which definition wins when two files define the same name.

mod parser;
mod resolve;

pub use parser::{parse_shader_source, read_shader_dir, read_shader_file};
pub use resolve::{find_duplicates, levelshot_files, required_files, ResolvedShaders};

use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// One named shader and the image files it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDefinition {
    /// Shader name: the first non-brace line of the block, verbatim.
    ///
    /// Unique within its owning file, but not globally.
    pub name: String,

    /// Image and video file paths referenced by the block's directives.
    pub images: BTreeSet<String>,
}

impl ShaderDefinition {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            images: BTreeSet::new(),
        }
    }
}

/// A parsed shader file.
#[derive(Debug, Clone)]
pub struct ShaderFile {
    /// Absolute path of the file.
    pub path: PathBuf,

    /// File stem, matched against `shaderlist.txt` entries.
    pub base_name: String,

    /// Whether the base name appears in the directory's shaderlist.
    ///
    /// A missing listing is a warning only; the file is still parsed and its
    /// definitions still participate in resolution.
    pub in_shaderlist: bool,

    /// Definitions in file order.
    pub definitions: Vec<ShaderDefinition>,
}

/// Errors that abort parsing of a single shader file.
///
/// The directory driver logs these and continues with the remaining files;
/// the failed file contributes no definitions.
#[derive(Debug, Error)]
pub enum ShaderParseError {
    /// The shader file could not be read.
    #[error("failed to read shader file {path}: {source}")]
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

    /// Braces nested deeper than shader block plus one directive body.
    #[error("bracket depth too deep in {path} line {line}")]
    TooDeep { path: PathBuf, line: usize },
}
