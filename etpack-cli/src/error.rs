//! CLI error type.

use std::fmt;

use etpack::{PackError, ResolveError};

/// Errors surfaced to the user as a failing exit code.
#[derive(Debug)]
pub enum CliError {
    /// Dependency resolution failed.
    Resolve(ResolveError),

    /// Packaging failed.
    Pack(PackError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Resolve(e) => write!(f, "resolution failed: {e}"),
            CliError::Pack(e) => write!(f, "packaging failed: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Resolve(e) => Some(e),
            CliError::Pack(e) => Some(e),
        }
    }
}

impl From<ResolveError> for CliError {
    fn from(e: ResolveError) -> Self {
        CliError::Resolve(e)
    }
}

impl From<PackError> for CliError {
    fn from(e: PackError) -> Self {
        CliError::Pack(e)
    }
}
