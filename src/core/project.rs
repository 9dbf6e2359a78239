//! Project identification.
//!
//! Project-scoped secrets are keyed by a [`ProjectId`]. Detection walks up
//! from the working directory to the nearest ancestor containing `.git`
//! (falling back to the working directory itself), canonicalizes that path,
//! and keeps the first 16 hex characters of its SHA-256 digest. The same
//! checkout therefore maps to the same id from any subdirectory.
//!
//! The id is computed by the CLI and handed to the core; nothing below
//! `core::vault` looks at the filesystem to find it.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::core::constants;
use crate::core::validation;
use crate::error::Result;

/// Stable identifier of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(String);

impl ProjectId {
    /// Use an explicit identifier verbatim.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidProject` if the id is empty or
    /// contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validation::validate_project(&id)?;
        Ok(Self(id))
    }

    /// Derive the identifier of the project containing `dir`.
    pub fn detect(dir: &Path) -> Result<Project> {
        let root = find_root(dir);
        let canonical = root.canonicalize()?;
        let id = Self::from_root(&canonical);
        debug!(root = %canonical.display(), id = %id, "detected project");
        Ok(Project { id, root: canonical })
    }

    /// Hash an already canonical project root.
    pub fn from_root(root: &Path) -> Self {
        let digest = Sha256::digest(root.to_string_lossy().as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Self(hex[..constants::PROJECT_ID_LEN].to_string())
    }

    /// The identifier as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A detected project: its id and the root it was derived from.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: ProjectId,
    pub root: PathBuf,
}

/// Nearest ancestor of `dir` (inclusive) holding the project marker.
fn find_root(dir: &Path) -> PathBuf {
    dir.ancestors()
        .find(|p| p.join(constants::PROJECT_MARKER).exists())
        .unwrap_or(dir)
        .to_path_buf()
}
