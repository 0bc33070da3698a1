//! `etpack shaders` - parse a scripts directory and report its contents.

use std::path::Path;

use etpack::shader::{find_duplicates, read_shader_dir};
use tracing::warn;

use crate::error::CliError;

pub fn run(scripts: &Path) -> Result<(), CliError> {
    let files = read_shader_dir(scripts);

    for file in &files {
        let marker = if file.in_shaderlist {
            ""
        } else {
            " (not in shaderlist)"
        };
        println!(
            "{:<40} {:>4} definitions{marker}",
            file.base_name,
            file.definitions.len()
        );
    }

    let total: usize = files.iter().map(|file| file.definitions.len()).sum();
    println!("{} shader files, {total} definitions", files.len());

    for (name, owners) in find_duplicates(&files) {
        let list = owners
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        warn!("shader '{name}' defined in {} files: {list}", owners.len());
    }

    Ok(())
}
