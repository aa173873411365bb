//! Loading a `.env` file before the command line is parsed.
//!
//! Variables already present in the process environment are never
//! overridden, so deployment settings win over a checked-in file.

use std::path::Path;

/// Looked up in the working directory.
pub const ENV_FILE: &str = ".env";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFile {
    Loaded,
    Missing,
}

/// Load `path` into the process environment. A missing file is not an error.
pub fn load(path: &Path) -> Result<EnvFile, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(EnvFile::Loaded),
        Err(e) if e.not_found() => Ok(EnvFile::Missing),
        Err(e) => Err(e),
    }
}
