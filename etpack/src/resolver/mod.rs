//! Dependency resolution: from a map path to a release file manifest.
//!
//! [`MapAssets::collect`] orchestrates the parsers against a mod root's
//! on-disk layout:
//!
//! 1. derive the mod root (two directory levels above the map) and validate
//!    the expected layout — findings are logged, validation never aborts;
//! 2. parse the map source (fatal on syntax error);
//! 3. parse all shader files and cross-reference the map's shader, terrain
//!    and levelshot references;
//! 4. fold in the optional mapscript, soundscript and speakerscript;
//! 5. collect lightmaps, the compiled bsp, the levelshot image and the other
//!    per-map odds and ends.
//!
//! [`MapAssets::manifest`] then flattens everything into deduplicated
//! `(source, target)` pairs ready for packaging.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::map::{parse_map, MapParseError};
use crate::scripts::{
    mapscript_path, parse_mapscript, parse_soundscript, parse_speakerscript, soundscript_path,
    speakerscript_path, ScriptError,
};
use crate::shader::{levelshot_files, read_shader_dir, required_files};

/// Stock archives every end-user install is assumed to contain.
pub const BASE_ARCHIVES: [&str; 3] = ["pak0.pk3", "pak1.pk3", "pak2.pk3"];

/// Glob matched against file names in the per-map lightmap directory.
const LIGHTMAP_GLOB: &str = "lm_????.tga";

/// Options for a resolution run.
#[derive(Debug, Default, Clone)]
pub struct ResolveOptions {
    /// Include the uncompiled `.map` source itself in the release.
    pub include_source: bool,
}

/// One resolved manifest entry: where a file lives and where it goes in the
/// release archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Absolute source path on disk. May be extension-less for ambiguous
    /// texture references; the packager resolves those.
    pub source: PathBuf,

    /// Archive-relative target path, forward slashes.
    pub target: String,
}

/// Errors that abort a resolution run.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The map path has no room for a mod root two levels up.
    #[error("map path {path} is not inside <modroot>/maps/")]
    InvalidLayout { path: PathBuf },

    /// The map path could not be resolved on disk.
    #[error("failed to locate map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The map source failed to parse; a partial descriptor is never used.
    #[error(transparent)]
    Map(#[from] MapParseError),

    /// A script file existed but could not be read.
    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// Everything a map's release package must contain, grouped the way it was
/// discovered. Read-only once collected.
#[derive(Debug)]
pub struct MapAssets {
    map_path: PathBuf,
    map_name: String,
    mod_root: PathBuf,

    /// Shader files owning matched definitions (absolute paths).
    shader_files: BTreeSet<PathBuf>,

    /// Mod-root-relative texture references from shader resolution and
    /// mapscript remaps.
    textures: BTreeSet<String>,

    /// Mod-root-relative model references.
    models: BTreeSet<String>,

    /// Mod-root-relative sound references.
    sounds: BTreeSet<String>,

    /// Individually collected files: scripts, lightmaps, bsp, levelshot,
    /// arena and friends (absolute paths).
    misc: BTreeSet<PathBuf>,
}

impl MapAssets {
    /// Resolve all release dependencies of one map.
    pub fn collect(map_path: &Path, options: &ResolveOptions) -> Result<Self, ResolveError> {
        let map_path = fs::canonicalize(map_path).map_err(|source| ResolveError::Io {
            path: map_path.to_path_buf(),
            source,
        })?;
        let mod_root = map_path
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .ok_or_else(|| ResolveError::InvalidLayout {
                path: map_path.clone(),
            })?;
        let map_name = map_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut assets = Self {
            map_path,
            map_name,
            mod_root,
            shader_files: BTreeSet::new(),
            textures: BTreeSet::new(),
            models: BTreeSet::new(),
            sounds: BTreeSet::new(),
            misc: BTreeSet::new(),
        };

        assets.validate_layout();
        assets.resolve(options)?;
        Ok(assets)
    }

    pub fn map_path(&self) -> &Path {
        &self.map_path
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn mod_root(&self) -> &Path {
        &self.mod_root
    }

    /// Paths of the stock archives under this mod root.
    pub fn base_archive_paths(&self) -> Vec<PathBuf> {
        BASE_ARCHIVES
            .iter()
            .map(|name| self.mod_root.join(name))
            .collect()
    }

    /// Check expected directories and base files, reporting every finding.
    ///
    /// Missing required entries are errors, missing optional ones warnings;
    /// either way resolution continues so all findings surface in one run.
    fn validate_layout(&self) {
        let in_maps = self
            .map_path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|name| name == "maps");
        if !in_maps {
            error!("map {} is not in a maps/ directory", self.map_path.display());
        }

        for dir in ["textures", "scripts", "maps"] {
            if !self.mod_root.join(dir).is_dir() {
                error!("directory '{}' not found", self.mod_root.join(dir).display());
            }
        }
        for dir in ["models", "sound", "levelshots", "video"] {
            if !self.mod_root.join(dir).is_dir() {
                warn!("directory '{}' not found", self.mod_root.join(dir).display());
            }
        }
        for file in BASE_ARCHIVES {
            if !self.mod_root.join(file).is_file() {
                error!("file '{}' not found", self.mod_root.join(file).display());
            }
        }
    }

    fn resolve(&mut self, options: &ResolveOptions) -> Result<(), ResolveError> {
        let map = parse_map(&self.map_path)?;
        self.sounds.extend(map.sounds.iter().cloned());
        self.models.extend(map.models.iter().cloned());

        let shader_files = read_shader_dir(&self.mod_root.join("scripts"));
        let mut resolved = required_files(&map, &shader_files);
        resolved.merge(levelshot_files(&self.map_name, &shader_files));
        self.textures.extend(resolved.textures);
        self.shader_files.extend(resolved.shader_files);

        self.resolve_scripts()?;
        self.collect_lightmaps();
        self.collect_misc_files();

        if options.include_source {
            self.misc.insert(self.map_path.clone());
        }

        Ok(())
    }

    fn resolve_scripts(&mut self) -> Result<(), ResolveError> {
        match parse_mapscript(&self.map_path)? {
            Some(script) => {
                self.sounds.extend(script.sounds);
                // Remap targets are shader references; resolved images for
                // them already came through the shader pass, but the raw
                // target may itself be a texture path.
                self.textures.extend(script.remaps);
                self.misc.insert(script.path);
            }
            None => info!(
                "mapscript not found '{}'",
                mapscript_path(&self.map_path).display()
            ),
        }

        match parse_soundscript(&self.mod_root, &self.map_name)? {
            Some(script) => {
                self.sounds.extend(script.sounds);
                self.misc.insert(script.path);
            }
            None => info!(
                "soundscript not found '{}'",
                soundscript_path(&self.mod_root, &self.map_name).display()
            ),
        }

        match parse_speakerscript(&self.mod_root, &self.map_name)? {
            Some(script) => {
                self.sounds.extend(script.sounds);
                self.misc.insert(script.path);
            }
            None => info!(
                "speakerscript not found '{}'",
                speakerscript_path(&self.mod_root, &self.map_name).display()
            ),
        }

        Ok(())
    }

    /// External lightmaps live in `maps/<mapname>/lm_NNNN.tga`.
    fn collect_lightmaps(&mut self) {
        let dir = self.mod_root.join("maps").join(&self.map_name);
        if !dir.is_dir() {
            info!("lightmap directory not found '{}'", dir.display());
            return;
        }

        let pattern = match glob::Pattern::new(LIGHTMAP_GLOB) {
            Ok(pattern) => pattern,
            Err(e) => {
                error!("invalid lightmap pattern: {e}");
                return;
            }
        };

        let mut found = 0usize;
        if let Ok(entries) = fs::read_dir(&dir) {
            for entry in entries.filter_map(|entry| entry.ok()) {
                let name = entry.file_name();
                if pattern.matches(&name.to_string_lossy()) {
                    self.misc.insert(entry.path());
                    found += 1;
                }
            }
        }

        if found == 0 {
            warn!(
                "lightmap directory found but contains no lightmaps ('{}')",
                dir.display()
            );
        }
    }

    /// Compiled bsp, levelshot image, arena, objdata and tracemap.
    fn collect_misc_files(&mut self) {
        let bsp = self.map_path.with_extension("bsp");
        if bsp.is_file() {
            self.misc.insert(bsp);
        } else {
            error!("compiled bsp not found '{}'", bsp.display());
        }

        let levelshot = self.mod_root.join("levelshots").join(&self.map_name);
        let tga = levelshot.with_extension("tga");
        let jpg = levelshot.with_extension("jpg");
        if tga.is_file() {
            self.misc.insert(tga);
        } else if jpg.is_file() {
            self.misc.insert(jpg);
        } else {
            info!("levelshot image (tga/jpg) not found '{}'", levelshot.display());
        }

        let arena = self
            .mod_root
            .join("scripts")
            .join(format!("{}.arena", self.map_name));
        if arena.is_file() {
            self.misc.insert(arena);
        } else {
            info!("no arena file found '{}'", arena.display());
        }

        let objdata = self
            .mod_root
            .join("maps")
            .join(format!("{}.objdata", self.map_name));
        if objdata.is_file() {
            self.misc.insert(objdata);
        } else {
            info!("no objective data file found '{}'", objdata.display());
        }

        let tracemap = self
            .mod_root
            .join("maps")
            .join(format!("{}_tracemap.tga", self.map_name));
        if tracemap.is_file() {
            self.misc.insert(tracemap);
        } else {
            info!("no tracemap found '{}'", tracemap.display());
        }
    }

    /// Flatten every collected set into `(source, target)` pairs.
    ///
    /// Entries are unique by target and come back in stable target order.
    /// Relative references resolve against the mod root; absolute paths are
    /// relativized against it, and anything outside the root is skipped with
    /// a warning.
    pub fn manifest(&self) -> Vec<ManifestEntry> {
        let mut by_target: BTreeMap<String, PathBuf> = BTreeMap::new();

        let references = self
            .textures
            .iter()
            .chain(self.models.iter())
            .chain(self.sounds.iter());
        for reference in references {
            let path = Path::new(reference);
            if path.is_absolute() {
                self.insert_absolute(&mut by_target, path);
            } else {
                by_target
                    .entry(reference.replace('\\', "/"))
                    .or_insert_with(|| self.mod_root.join(reference));
            }
        }

        for path in self.shader_files.iter().chain(self.misc.iter()) {
            self.insert_absolute(&mut by_target, path);
        }

        by_target
            .into_iter()
            .map(|(target, source)| ManifestEntry { source, target })
            .collect()
    }

    fn insert_absolute(&self, by_target: &mut BTreeMap<String, PathBuf>, path: &Path) {
        match path.strip_prefix(&self.mod_root) {
            Ok(relative) => {
                let target = relative
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                by_target
                    .entry(target)
                    .or_insert_with(|| path.to_path_buf());
            }
            Err(_) => warn!(
                "file '{}' is outside the mod root '{}'; skipping",
                path.display(),
                self.mod_root.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACE: &str = "( 0 0 0 ) ( 1 0 0 ) ( 0 1 0 ) walls/brick 0 0 0 0.5 0.5 0 4 0";

    /// Build a small but complete mod root on disk.
    fn synthetic_mod_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        for sub in ["maps", "scripts", "textures", "levelshots"] {
            fs::create_dir(root.join(sub)).expect("mkdir");
        }

        fs::write(
            root.join("maps").join("river.map"),
            format!(
                "// entity 0\n{{\n\"classname\" \"worldspawn\"\n// brush 0\n{{\n{FACE}\n}}\n}}\n// entity 1\n{{\n\"classname\" \"target_speaker\"\n\"noise\" \"sound/world/river.wav\"\n}}\n"
            ),
        )
        .expect("write map");
        fs::write(root.join("maps").join("river.bsp"), b"BSP").expect("write bsp");
        fs::write(
            root.join("scripts").join("river_walls.shader"),
            "textures/walls/brick\n{\n{\nmap textures/walls/brick.tga\n}\n}\n",
        )
        .expect("write shader");
        fs::write(root.join("scripts").join("shaderlist.txt"), "river_walls\n")
            .expect("write shaderlist");
        fs::write(root.join("levelshots").join("river.tga"), b"TGA").expect("write levelshot");
        dir
    }

    #[test]
    fn collects_expected_manifest() {
        let dir = synthetic_mod_root();
        let map = dir.path().join("maps").join("river.map");

        let assets =
            MapAssets::collect(&map, &ResolveOptions::default()).expect("collect should succeed");
        let targets: Vec<String> = assets
            .manifest()
            .into_iter()
            .map(|entry| entry.target)
            .collect();

        assert_eq!(
            targets,
            vec![
                "levelshots/river.tga",
                "maps/river.bsp",
                "scripts/river_walls.shader",
                "sound/world/river.wav",
                "textures/walls/brick.tga",
            ]
        );
    }

    #[test]
    fn manifest_sources_resolve_against_mod_root() {
        let dir = synthetic_mod_root();
        let map = dir.path().join("maps").join("river.map");
        let assets = MapAssets::collect(&map, &ResolveOptions::default()).expect("collect");

        for entry in assets.manifest() {
            assert!(
                entry.source.starts_with(assets.mod_root()),
                "source {} should live under the mod root",
                entry.source.display()
            );
            assert!(!entry.target.contains('\\'));
        }
    }

    #[test]
    fn include_source_adds_the_map_itself() {
        let dir = synthetic_mod_root();
        let map = dir.path().join("maps").join("river.map");
        let options = ResolveOptions {
            include_source: true,
        };
        let assets = MapAssets::collect(&map, &options).expect("collect");
        assert!(assets
            .manifest()
            .iter()
            .any(|entry| entry.target == "maps/river.map"));
    }

    #[test]
    fn resolution_is_idempotent() {
        let dir = synthetic_mod_root();
        let map = dir.path().join("maps").join("river.map");

        let first = MapAssets::collect(&map, &ResolveOptions::default())
            .expect("collect")
            .manifest();
        let second = MapAssets::collect(&map, &ResolveOptions::default())
            .expect("collect")
            .manifest();
        assert_eq!(first, second);
    }

    #[test]
    fn mapscript_contributes_sounds_remaps_and_itself() {
        let dir = synthetic_mod_root();
        let root = dir.path();
        fs::write(
            root.join("maps").join("river.script"),
            "game_manager\n{\n\tplaysound \"sound/music/win.wav\"\n\tremapshader textures/old \"textures/walls/brick_new.tga\"\n}\n",
        )
        .expect("write script");

        let map = root.join("maps").join("river.map");
        let assets = MapAssets::collect(&map, &ResolveOptions::default()).expect("collect");
        let targets: BTreeSet<String> = assets
            .manifest()
            .into_iter()
            .map(|entry| entry.target)
            .collect();

        assert!(targets.contains("maps/river.script"));
        assert!(targets.contains("sound/music/win.wav"));
        assert!(targets.contains("textures/walls/brick_new.tga"));
    }

    #[test]
    fn lightmaps_are_picked_up_by_glob() {
        let dir = synthetic_mod_root();
        let root = dir.path();
        let lm_dir = root.join("maps").join("river");
        fs::create_dir(&lm_dir).expect("mkdir");
        fs::write(lm_dir.join("lm_0000.tga"), b"LM").expect("write");
        fs::write(lm_dir.join("lm_0001.tga"), b"LM").expect("write");
        fs::write(lm_dir.join("readme.txt"), b"not a lightmap").expect("write");

        let map = root.join("maps").join("river.map");
        let assets = MapAssets::collect(&map, &ResolveOptions::default()).expect("collect");
        let targets: BTreeSet<String> = assets
            .manifest()
            .into_iter()
            .map(|entry| entry.target)
            .collect();

        assert!(targets.contains("maps/river/lm_0000.tga"));
        assert!(targets.contains("maps/river/lm_0001.tga"));
        assert!(!targets.contains("maps/river/readme.txt"));
    }

    #[test]
    fn unresolved_shader_reference_is_not_fatal() {
        let dir = synthetic_mod_root();
        let root = dir.path();
        fs::write(
            root.join("maps").join("river.map"),
            "// entity 0\n{\n\"classname\" \"worldspawn\"\n\"_fog\" \"textures/fog/nonexistent\"\n}\n",
        )
        .expect("rewrite map");

        let map = root.join("maps").join("river.map");
        let assets = MapAssets::collect(&map, &ResolveOptions::default()).expect("collect");
        let targets: BTreeSet<String> = assets
            .manifest()
            .into_iter()
            .map(|entry| entry.target)
            .collect();
        assert!(!targets.iter().any(|t| t.contains("nonexistent")));
    }

    #[test]
    fn map_syntax_error_is_fatal() {
        let dir = synthetic_mod_root();
        let root = dir.path();
        fs::write(root.join("maps").join("river.map"), "not a map\n").expect("rewrite map");

        let map = root.join("maps").join("river.map");
        let err = MapAssets::collect(&map, &ResolveOptions::default()).unwrap_err();
        assert!(matches!(err, ResolveError::Map(_)));
    }

    #[test]
    fn missing_map_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let map = dir.path().join("maps").join("absent.map");
        let err = MapAssets::collect(&map, &ResolveOptions::default()).unwrap_err();
        assert!(matches!(err, ResolveError::Io { .. }));
    }
}
