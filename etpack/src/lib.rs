//! etpack - Release packaging for Wolfenstein: Enemy Territory maps
//!
//! This library scans a map's source description and its supporting asset
//! scripts, computes the exact set of files a playable release must contain,
//! and materializes that set into a `.pk3` archive while skipping files that
//! are already shipped in the stock `pak*.pk3` archives.
//!
//! # Pipeline
//!
//! ```text
//! .map source ──► map::parse_map ──────────┐
//! scripts/*.shader ──► shader::read_shader_dir ──► resolver::MapAssets ──► manifest
//! mapscript / soundscript / speakerscript ─┘                                  │
//!                                                                             ▼
//! pak0.pk3.. ──► archive::BaseSnapshot ─────────────────► archive::pack_release
//! ```
//!
//! The library only emits diagnostics through the [`tracing`] facade; the
//! subscriber (sink, filtering, formatting) is owned by the binary.

pub mod archive;
pub mod lines;
pub mod map;
pub mod resolver;
pub mod scripts;
pub mod shader;

pub use archive::{pack_release, BaseEntry, BaseSnapshot, PackError, PackSummary};
pub use map::{MapDescriptor, MapParseError};
pub use resolver::{ManifestEntry, MapAssets, ResolveError, ResolveOptions};
pub use shader::{ShaderDefinition, ShaderFile, ShaderParseError};
