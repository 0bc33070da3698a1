//! CLI command implementations.

pub mod pack;
pub mod scan;
pub mod shaders;
