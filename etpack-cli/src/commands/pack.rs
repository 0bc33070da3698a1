//! `etpack pack` - resolve, diff against the base install, write the pk3.

use std::path::{Path, PathBuf};

use etpack::{pack_release, BaseSnapshot, MapAssets, ResolveOptions};
use tracing::info;

use crate::error::CliError;

pub fn run(
    map: &Path,
    output: &Path,
    base: &[PathBuf],
    include_source: bool,
) -> Result<(), CliError> {
    let options = ResolveOptions { include_source };
    let assets = MapAssets::collect(map, &options)?;

    let base_paths = if base.is_empty() {
        assets.base_archive_paths()
    } else {
        base.to_vec()
    };
    let snapshot = BaseSnapshot::read(&base_paths);
    info!(
        "base snapshot: {} files from {} archives",
        snapshot.len(),
        base_paths.len()
    );

    let manifest = assets.manifest();
    let summary = pack_release(&manifest, &snapshot, output)?;

    println!(
        "{}: {} files packed, {} already in base archives, {} unresolved",
        output.display(),
        summary.included,
        summary.skipped,
        summary.unresolved
    );

    Ok(())
}
