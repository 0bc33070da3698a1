//! State-machine parser for the map source format.
//!
//! States: `Outside → Entity → {Brush → Patch → Brush} → Entity → Outside`.
//! Entities are opened by a `// entity` marker line, brushes by `// brush`,
//! patches by `patchDef2`; each marker must be followed by an opening brace.
//! Comment lines are significant here, so the input is only cleaned, never
//! comment-filtered.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::warn;

use super::{MapDescriptor, MapParseError};
use crate::lines::clean_lines;

/// Implicit path prefix for brush, patch and terrain textures.
const TEXTURE_PREFIX: &str = "textures/";

const ENTITY_MARKER: &str = "// entity";
const BRUSH_MARKER: &str = "// brush";
const PATCH_MARKER: &str = "patchDef2";

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    Entity,
    Brush,
    Patch,
}

/// Buffered keys of the entity currently being read.
///
/// Only inspected when the entity closes: classification (gamemodel vs
/// terrain vs plain shader) depends on key combinations that may arrive in
/// any order.
#[derive(Default)]
struct EntityScratch {
    classname: Option<String>,
    model: Option<String>,
    shader: Option<String>,
    terrain: Option<String>,
}

/// Parse a map file from disk.
pub fn parse_map(path: &Path) -> Result<MapDescriptor, MapParseError> {
    let source = fs::read_to_string(path).map_err(|source| MapParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_map_source(path, &source)
}

/// Parse already-read map source text.
///
/// `path` is only used for naming the descriptor and for diagnostics.
pub fn parse_map_source(path: &Path, source: &str) -> Result<MapDescriptor, MapParseError> {
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut descriptor = MapDescriptor::new(name, path);

    let mut state = State::Outside;
    let mut expect: Option<&'static str> = None;
    let mut read_until: Option<&'static str> = None;
    let mut scratch = EntityScratch::default();

    for (line, number) in clean_lines(source) {
        if let Some(token) = expect {
            if line.starts_with(token) {
                expect = None;
                continue;
            }
            return Err(MapParseError::Expected {
                expected: token.to_string(),
                found: line.to_string(),
                path: path.to_path_buf(),
                line: number,
            });
        }

        if let Some(terminator) = read_until {
            if line == terminator {
                read_until = None;
            }
            continue;
        }

        match state {
            State::Outside => {
                if !line.starts_with(ENTITY_MARKER) {
                    return Err(MapParseError::UnexpectedToken {
                        found: line.to_string(),
                        path: path.to_path_buf(),
                        line: number,
                    });
                }
                state = State::Entity;
                expect = Some("{");
            }
            State::Entity => {
                if line.starts_with('}') {
                    close_entity(&mut descriptor, &mut scratch, number);
                    state = State::Outside;
                } else if line.starts_with(BRUSH_MARKER) {
                    state = State::Brush;
                    expect = Some("{");
                } else if let Some((key, value)) = key_value(line) {
                    entity_key(&mut descriptor, &mut scratch, key, value);
                }
            }
            State::Brush => {
                if line.starts_with(PATCH_MARKER) {
                    state = State::Patch;
                    expect = Some("{");
                } else if line.starts_with('}') {
                    state = State::Entity;
                } else {
                    // Plain face row: the 16th token is the texture name.
                    let texture = line.split_whitespace().nth(15).ok_or_else(|| {
                        MapParseError::MalformedBrushFace {
                            path: path.to_path_buf(),
                            line: number,
                        }
                    })?;
                    insert(&mut descriptor.shaders, prefixed(texture));
                }
            }
            State::Patch => {
                // The first body line names the texture; the control-point
                // grid that follows is irrelevant to asset resolution.
                insert(&mut descriptor.shaders, prefixed(line));
                read_until = Some("}");
                state = State::Brush;
            }
        }
    }

    if state != State::Outside {
        warn!("map source {} ended inside an open block", path.display());
    }

    Ok(descriptor)
}

/// Handle one `"key" value` line inside an entity.
fn entity_key(descriptor: &mut MapDescriptor, scratch: &mut EntityScratch, key: &str, value: String) {
    match key {
        "classname" => scratch.classname = Some(value),
        "model" => scratch.model = Some(value),
        "model2" => insert(&mut descriptor.models, value),
        "noise" | "sound" => insert(&mut descriptor.sounds, value),
        "_fog" => insert(&mut descriptor.shaders, value),
        "shader" => scratch.shader = Some(value),
        "terrain" => scratch.terrain = Some(value),
        // Remap keys may carry an index suffix (_remap1, _remap2, ...);
        // only the last semicolon-delimited segment names a shader.
        _ if key.starts_with("_remap") => {
            if let Some(last) = value.split(';').next_back() {
                insert(&mut descriptor.shaders, last.to_string());
            }
        }
        _ => {}
    }
}

/// Flush the buffered keys when an entity closes.
fn close_entity(descriptor: &mut MapDescriptor, scratch: &mut EntityScratch, line: usize) {
    let scratch = std::mem::take(scratch);

    let Some(classname) = scratch.classname else {
        // A shader or model key without a classname contributes nothing.
        warn!("entity without classname on line {line}");
        return;
    };

    if classname == "misc_gamemodel" {
        if let Some(model) = scratch.model {
            insert(&mut descriptor.models, model);
        }
    }

    if let Some(shader) = scratch.shader {
        // Terrain shaders skip the implicit textures/ prefix on disk, so
        // they go to their own set and get resolved by name prefix.
        let is_terrain = scratch
            .terrain
            .as_deref()
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("1"));
        if is_terrain {
            insert(&mut descriptor.terrains, prefixed(&shader));
        } else {
            insert(&mut descriptor.shaders, shader);
        }
    }
}

/// Split a `"key" value` line; the value keeps everything after the first
/// space with all quote characters removed.
fn key_value(line: &str) -> Option<(&str, String)> {
    let rest = line.strip_prefix('"')?;
    let end = rest.find('"')?;
    let key = &rest[..end];
    let value = rest[end + 1..].trim().replace('"', "");
    Some((key, value))
}

fn prefixed(texture: &str) -> String {
    format!("{TEXTURE_PREFIX}{texture}")
}

fn insert(set: &mut BTreeSet<String>, value: String) {
    if !value.is_empty() {
        set.insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(source: &str) -> MapDescriptor {
        parse_map_source(&PathBuf::from("/mod/maps/test.map"), source).expect("map should parse")
    }

    const FACE: &str = "( 0 0 0 ) ( 1 0 0 ) ( 0 1 0 ) common/caulk 0 0 0 0.5 0.5 0 4 0";

    #[test]
    fn minimal_map_yields_single_brush_texture() {
        let source = format!(
            "// entity 0\n{{\n\"classname\" \"info_player_start\"\n// brush 0\n{{\n{FACE}\n}}\n}}\n"
        );
        let map = parse(&source);
        assert_eq!(map.name, "test");
        assert_eq!(
            map.shaders,
            BTreeSet::from(["textures/common/caulk".to_string()])
        );
        assert!(map.models.is_empty());
        assert!(map.sounds.is_empty());
        assert!(map.terrains.is_empty());
    }

    #[test]
    fn gamemodel_entity_contributes_model() {
        let source = "// entity 0\n{\n\"classname\" \"misc_gamemodel\"\n\"model\" \"models/mapobjects/tree.md3\"\n}\n";
        let map = parse(source);
        assert_eq!(
            map.models,
            BTreeSet::from(["models/mapobjects/tree.md3".to_string()])
        );
    }

    #[test]
    fn model2_and_sounds_are_added_directly() {
        let source = "// entity 0\n{\n\"classname\" \"func_door\"\n\"model2\" \"models/door.md3\"\n\"noise\" \"sound/door/slide.wav\"\n\"sound\" \"sound/door/thud.wav\"\n}\n";
        let map = parse(source);
        assert_eq!(map.models, BTreeSet::from(["models/door.md3".to_string()]));
        assert_eq!(
            map.sounds,
            BTreeSet::from([
                "sound/door/slide.wav".to_string(),
                "sound/door/thud.wav".to_string()
            ])
        );
    }

    #[test]
    fn remap_value_keeps_only_last_segment() {
        let source =
            "// entity 0\n{\n\"classname\" \"worldspawn\"\n\"_remap1\" \"old;new\"\n}\n";
        let map = parse(source);
        assert!(map.shaders.contains("new"));
        assert!(!map.shaders.contains("old"));
        assert!(!map.shaders.contains("old;new"));
    }

    #[test]
    fn terrain_flag_routes_shader_to_terrain_set() {
        let source = "// entity 0\n{\n\"classname\" \"func_group\"\n\"shader\" \"hills/terrain\"\n\"terrain\" \"1\"\n}\n";
        let map = parse(source);
        assert!(map.shaders.is_empty());
        assert_eq!(
            map.terrains,
            BTreeSet::from(["textures/hills/terrain".to_string()])
        );
    }

    #[test]
    fn shader_without_terrain_flag_stays_verbatim() {
        let source = "// entity 0\n{\n\"classname\" \"func_group\"\n\"shader\" \"hills/terrain\"\n}\n";
        let map = parse(source);
        assert_eq!(map.shaders, BTreeSet::from(["hills/terrain".to_string()]));
        assert!(map.terrains.is_empty());
    }

    #[test]
    fn entity_without_classname_contributes_nothing() {
        let source = "// entity 0\n{\n\"shader\" \"hills/terrain\"\n\"model\" \"models/x.md3\"\n}\n";
        let map = parse(source);
        assert!(map.shaders.is_empty());
        assert!(map.models.is_empty());
    }

    #[test]
    fn fog_key_is_a_shader_reference() {
        let source = "// entity 0\n{\n\"classname\" \"worldspawn\"\n\"_fog\" \"textures/fog/dense\"\n}\n";
        let map = parse(source);
        assert!(map.shaders.contains("textures/fog/dense"));
    }

    #[test]
    fn patch_block_names_texture_and_skips_grid() {
        let source = format!(
            "// entity 0\n{{\n\"classname\" \"worldspawn\"\n// brush 0\n{{\npatchDef2\n{{\nskies/night\n( 3 3 0 0 0 )\n(\n( ( 0 0 0 0 0 ) )\n)\n}}\n}}\n// brush 1\n{{\n{FACE}\n}}\n}}\n"
        );
        let map = parse(&source);
        assert_eq!(
            map.shaders,
            BTreeSet::from([
                "textures/skies/night".to_string(),
                "textures/common/caulk".to_string()
            ])
        );
    }

    #[test]
    fn missing_brace_after_entity_marker_is_reported() {
        let source = "// entity 0\n\"classname\" \"worldspawn\"\n";
        let err = parse_map_source(&PathBuf::from("bad.map"), source).unwrap_err();
        match err {
            MapParseError::Expected {
                expected,
                found,
                line,
                ..
            } => {
                assert_eq!(expected, "{");
                assert_eq!(found, "\"classname\" \"worldspawn\"");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stray_top_level_token_is_fatal() {
        let err = parse_map_source(&PathBuf::from("bad.map"), "worldspawn\n").unwrap_err();
        assert!(matches!(err, MapParseError::UnexpectedToken { line: 1, .. }));
    }

    #[test]
    fn short_brush_face_is_a_syntax_error() {
        let source = "// entity 0\n{\n// brush 0\n{\n( 0 0 0 ) caulk\n}\n}\n";
        let err = parse_map_source(&PathBuf::from("bad.map"), source).unwrap_err();
        assert!(matches!(err, MapParseError::MalformedBrushFace { .. }));
    }

    #[test]
    fn duplicate_references_are_deduplicated() {
        let source = format!(
            "// entity 0\n{{\n\"classname\" \"worldspawn\"\n// brush 0\n{{\n{FACE}\n{FACE}\n}}\n}}\n"
        );
        let map = parse(&source);
        assert_eq!(map.shaders.len(), 1);
    }
}
