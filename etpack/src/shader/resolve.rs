//! Cross-referencing map shader references against parsed shader files.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::warn;

use super::ShaderFile;
use crate::map::MapDescriptor;

/// Files discovered by shader resolution.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolvedShaders {
    /// Image and video files referenced by the matched definitions,
    /// mod-root-relative.
    pub textures: BTreeSet<String>,

    /// Shader files that own at least one matched definition. These ship in
    /// the release so the engine can find the definitions at runtime.
    pub shader_files: BTreeSet<PathBuf>,
}

impl ResolvedShaders {
    /// Fold another resolution result into this one.
    pub fn merge(&mut self, other: ResolvedShaders) {
        self.textures.extend(other.textures);
        self.shader_files.extend(other.shader_files);
    }
}

/// Resolve a map's shader and terrain references.
///
/// Ordinary shader names are resolved **first-match**: shader files are
/// scanned in the order given and the first definition with an exactly
/// matching name wins, even if a later file defines the same name with a
/// different image set. A name matched by no file is reported as a warning
/// and contributes nothing; the bare name is never assumed to be a texture.
///
/// Terrain references are the deliberate exception: every definition whose
/// name starts with the terrain prefix contributes its images, across all
/// files, as a union.
pub fn required_files(map: &MapDescriptor, shader_files: &[ShaderFile]) -> ResolvedShaders {
    let mut resolved = ResolvedShaders::default();

    for shader_name in &map.shaders {
        let hit = shader_files.iter().find_map(|file| {
            file.definitions
                .iter()
                .find(|definition| &definition.name == shader_name)
                .map(|definition| (file, definition))
        });

        match hit {
            Some((file, definition)) => {
                resolved.textures.extend(definition.images.iter().cloned());
                resolved.shader_files.insert(file.path.clone());
            }
            None => warn!("shader {shader_name} not found in any shader file"),
        }
    }

    for terrain in &map.terrains {
        for file in shader_files {
            for definition in &file.definitions {
                if definition.name.starts_with(terrain.as_str()) {
                    resolved.textures.extend(definition.images.iter().cloned());
                }
            }
        }
    }

    resolved
}

/// Find the synthetic levelshot shader for a map, if any file defines one.
///
/// Campaign menus reference a shader named `levelshots/<mapname>`; when a
/// definition with that prefix exists its images and owning file are required
/// in the release.
pub fn levelshot_files(map_name: &str, shader_files: &[ShaderFile]) -> ResolvedShaders {
    let prefix = format!("levelshots/{map_name}");
    let mut resolved = ResolvedShaders::default();

    for file in shader_files {
        for definition in &file.definitions {
            if definition.name.starts_with(&prefix) {
                resolved.textures.extend(definition.images.iter().cloned());
                resolved.shader_files.insert(file.path.clone());
            }
        }
    }

    resolved
}

/// Report shader names defined in more than one file.
///
/// Duplicates are legal (first-match resolution picks a winner) but usually
/// unintended, so the scan command surfaces them.
pub fn find_duplicates(shader_files: &[ShaderFile]) -> Vec<(String, Vec<PathBuf>)> {
    let mut owners: BTreeMap<&str, Vec<PathBuf>> = BTreeMap::new();

    for file in shader_files {
        for definition in &file.definitions {
            match owners.entry(&definition.name) {
                Entry::Vacant(slot) => {
                    slot.insert(vec![file.path.clone()]);
                }
                Entry::Occupied(mut slot) => slot.get_mut().push(file.path.clone()),
            }
        }
    }

    owners
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|(name, files)| (name.to_string(), files))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::ShaderDefinition;
    use std::path::Path;

    fn shader_file(path: &str, definitions: &[(&str, &[&str])]) -> ShaderFile {
        ShaderFile {
            path: PathBuf::from(path),
            base_name: Path::new(path)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            in_shaderlist: true,
            definitions: definitions
                .iter()
                .map(|(name, images)| {
                    let mut definition = ShaderDefinition::new(*name);
                    definition
                        .images
                        .extend(images.iter().map(|i| i.to_string()));
                    definition
                })
                .collect(),
        }
    }

    fn map_with(shaders: &[&str], terrains: &[&str]) -> MapDescriptor {
        let mut map = MapDescriptor::new("test", "/mod/maps/test.map");
        map.shaders.extend(shaders.iter().map(|s| s.to_string()));
        map.terrains.extend(terrains.iter().map(|s| s.to_string()));
        map
    }

    #[test]
    fn first_match_wins_over_later_files() {
        let files = vec![
            shader_file("scripts/a.shader", &[("textures/x", &["a.tga"])]),
            shader_file("scripts/b.shader", &[("textures/x", &["b.tga"])]),
        ];
        let resolved = required_files(&map_with(&["textures/x"], &[]), &files);
        assert_eq!(resolved.textures, BTreeSet::from(["a.tga".to_string()]));
        assert_eq!(
            resolved.shader_files,
            BTreeSet::from([PathBuf::from("scripts/a.shader")])
        );
    }

    #[test]
    fn unresolved_shader_contributes_nothing() {
        let files = vec![shader_file(
            "scripts/a.shader",
            &[("textures/other", &["o.tga"])],
        )];
        let resolved = required_files(&map_with(&["textures/missing"], &[]), &files);
        assert!(resolved.textures.is_empty());
        assert!(resolved.shader_files.is_empty());
    }

    #[test]
    fn terrain_matches_union_across_files() {
        let files = vec![
            shader_file(
                "scripts/a.shader",
                &[("textures/hills/terrain_0", &["hills0.tga"])],
            ),
            shader_file(
                "scripts/b.shader",
                &[
                    ("textures/hills/terrain_1", &["hills1.tga"]),
                    ("textures/unrelated", &["no.tga"]),
                ],
            ),
        ];
        let resolved = required_files(&map_with(&[], &["textures/hills/terrain"]), &files);
        assert_eq!(
            resolved.textures,
            BTreeSet::from(["hills0.tga".to_string(), "hills1.tga".to_string()])
        );
        // Terrain matches do not pull in owning shader files by themselves.
        assert!(resolved.shader_files.is_empty());
    }

    #[test]
    fn levelshot_shader_is_matched_by_prefix() {
        let files = vec![shader_file(
            "scripts/levelshots.shader",
            &[("levelshots/test_cc", &["levelshots/test_cc.tga"])],
        )];
        let resolved = levelshot_files("test", &files);
        assert_eq!(
            resolved.textures,
            BTreeSet::from(["levelshots/test_cc.tga".to_string()])
        );
        assert_eq!(
            resolved.shader_files,
            BTreeSet::from([PathBuf::from("scripts/levelshots.shader")])
        );
    }

    #[test]
    fn duplicates_are_reported_with_owning_files() {
        let files = vec![
            shader_file("scripts/a.shader", &[("textures/x", &["a.tga"])]),
            shader_file("scripts/b.shader", &[("textures/x", &["b.tga"])]),
            shader_file("scripts/c.shader", &[("textures/y", &["c.tga"])]),
        ];
        let duplicates = find_duplicates(&files);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].0, "textures/x");
        assert_eq!(
            duplicates[0].1,
            vec![
                PathBuf::from("scripts/a.shader"),
                PathBuf::from("scripts/b.shader")
            ]
        );
    }
}
