//! `etpack scan` - resolve a map and print its release manifest.

use std::path::Path;

use etpack::{MapAssets, ResolveOptions};

use crate::error::CliError;

pub fn run(map: &Path, include_source: bool) -> Result<(), CliError> {
    let options = ResolveOptions { include_source };
    let assets = MapAssets::collect(map, &options)?;
    let manifest = assets.manifest();

    for (index, entry) in manifest.iter().enumerate() {
        println!("{:<5} {}", index + 1, entry.target);
    }
    println!(
        "{} files required for '{}'",
        manifest.len(),
        assets.map_name()
    );

    Ok(())
}
