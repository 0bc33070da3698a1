//! Base-archive snapshots and release packaging.
//!
//! `.pk3` files are plain zip containers. [`BaseSnapshot`] flattens the
//! entry lists of the stock archives into one immutable membership index;
//! [`pack_release`] diffs a resolved manifest against it and writes the
//! files that remain into a fresh release archive.

mod packer;
mod snapshot;

pub use packer::{pack_release, PackError, PackSummary};
pub use snapshot::{BaseEntry, BaseSnapshot};
