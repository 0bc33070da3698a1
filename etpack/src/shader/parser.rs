//! Shader file parsing: per-file state machine and directory driver.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use super::{ShaderDefinition, ShaderFile, ShaderParseError};
use crate::lines::{clean_lines, skip_comment_lines};

/// Name of the per-directory shader manifest file.
const SHADERLIST: &str = "shaderlist.txt";

/// Synthetic image names that never correspond to files on disk.
const SYNTHETIC_IMAGES: [&str; 2] = ["$lightmap", "$whiteimage"];

/// Read every `*.shader` file in a scripts directory.
///
/// Files are visited in sorted path order so that first-match resolution is
/// deterministic. A missing directory or an empty file set is reported and
/// yields an empty result; downstream resolution then simply finds no
/// matches. A file that fails to parse is reported and contributes no
/// definitions; the remaining files are still read.
pub fn read_shader_dir(scripts_dir: &Path) -> Vec<ShaderFile> {
    if !scripts_dir.is_dir() {
        error!("scripts directory not found in '{}'", scripts_dir.display());
        return Vec::new();
    }

    let shaderlist = read_shaderlist(scripts_dir);

    let mut paths: Vec<PathBuf> = match fs::read_dir(scripts_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "shader"))
            .collect(),
        Err(e) => {
            error!("failed to list '{}': {e}", scripts_dir.display());
            return Vec::new();
        }
    };
    paths.sort();

    if paths.is_empty() {
        error!("no .shader files found in '{}'", scripts_dir.display());
    }

    paths
        .iter()
        .map(|path| read_shader_file(path, shaderlist.as_ref()))
        .collect()
}

/// Read and parse a single shader file.
///
/// `shaderlist` is the parsed manifest, or `None` when the directory has no
/// `shaderlist.txt`; the cross-check is skipped in that case.
pub fn read_shader_file(path: &Path, shaderlist: Option<&BTreeSet<String>>) -> ShaderFile {
    let base_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let in_shaderlist = shaderlist.is_some_and(|list| list.contains(&base_name));
    if !in_shaderlist && shaderlist.is_some_and(|list| !list.is_empty()) {
        warn!("shader file '{base_name}' not listed in {SHADERLIST}");
    }

    let definitions = match fs::read_to_string(path) {
        Ok(source) => match parse_shader_source(path, &source) {
            Ok(definitions) => definitions,
            Err(e) => {
                // Syntax error: discard this file's definitions, keep going.
                error!("{e}");
                Vec::new()
            }
        },
        Err(e) => {
            error!("failed to read shader file {}: {e}", path.display());
            Vec::new()
        }
    };

    debug!(
        "parsed {} shader definitions from {}",
        definitions.len(),
        path.display()
    );

    ShaderFile {
        path: path.to_path_buf(),
        base_name,
        in_shaderlist,
        definitions,
    }
}

/// Parse shader source text into its definitions.
///
/// Structure per definition: a name line, an opening brace, any number of
/// keyword lines and brace-delimited directive bodies, and a closing brace.
/// Nesting deeper than shader block plus directive body is a syntax error
/// that aborts the whole file.
pub fn parse_shader_source(
    path: &Path,
    source: &str,
) -> Result<Vec<ShaderDefinition>, ShaderParseError> {
    let mut definitions = Vec::new();

    let mut expect: Option<&'static str> = None;
    let mut in_shader = false;
    let mut in_directive = false;
    let mut current: Option<ShaderDefinition> = None;

    for (line, number) in skip_comment_lines(clean_lines(source)) {
        if let Some(token) = expect {
            if line.starts_with(token) {
                expect = None;
                continue;
            }
            return Err(ShaderParseError::Expected {
                expected: token.to_string(),
                found: line.to_string(),
                path: path.to_path_buf(),
                line: number,
            });
        }

        if !in_shader {
            current = Some(ShaderDefinition::new(line));
            expect = Some("{");
            in_shader = true;
            continue;
        }

        if line.starts_with('}') {
            if in_directive {
                in_directive = false;
            } else {
                definitions.extend(current.take());
                in_shader = false;
            }
            continue;
        }

        if line.starts_with('{') {
            if in_directive {
                return Err(ShaderParseError::TooDeep {
                    path: path.to_path_buf(),
                    line: number,
                });
            }
            in_directive = true;
            continue;
        }

        if in_directive {
            if let Some(shader) = current.as_mut() {
                apply_directive(line, shader);
            }
        }
    }

    if in_shader {
        warn!(
            "shader file {} ended inside an open block; dropping incomplete definition",
            path.display()
        );
    }

    Ok(definitions)
}

/// Record the image files named by one directive line, if any.
fn apply_directive(line: &str, shader: &mut ShaderDefinition) {
    let mut tokens = line.split_whitespace();
    let Some(keyword) = tokens.next() else {
        return;
    };
    let keyword = keyword.to_ascii_lowercase();

    // implicitMap, implicitMask and friends all behave like implicitMap for
    // our purposes: the second token names the image, and a lone "-" means
    // the shader's own name doubles as the image path.
    if keyword.starts_with("implicit") {
        if let Some(image) = tokens.next() {
            if image == "-" {
                shader.images.insert(shader.name.clone());
            } else {
                shader.images.insert(image.to_string());
            }
        }
        return;
    }

    match keyword.as_str() {
        "map" | "clampmap" => {
            if let Some(image) = tokens.next() {
                let synthetic = SYNTHETIC_IMAGES
                    .iter()
                    .any(|s| image.eq_ignore_ascii_case(s));
                if !synthetic {
                    shader.images.insert(image.to_string());
                }
            }
        }
        "animmap" => {
            // First argument is the frame rate; every token after it is a
            // frame image.
            for image in tokens.skip(1) {
                shader.images.insert(image.to_string());
            }
        }
        "videomap" => {
            if let Some(name) = tokens.next() {
                shader.images.insert(format!("video/{name}"));
            }
        }
        _ => {}
    }
}

/// Parse `shaderlist.txt` if present: one shader base name per line,
/// comment and blank lines ignored.
fn read_shaderlist(scripts_dir: &Path) -> Option<BTreeSet<String>> {
    let path = scripts_dir.join(SHADERLIST);
    match fs::read_to_string(&path) {
        Ok(source) => Some(
            skip_comment_lines(clean_lines(&source))
                .map(|(line, _)| line.to_string())
                .collect(),
        ),
        Err(_) => {
            warn!("{SHADERLIST} not found in '{}'", scripts_dir.display());
            None
        }
    }
}
