//! Env file type.
//!
//! Renders resolved secrets in `.env` format and writes them atomically.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;
use zeroize::Zeroizing;

use crate::error::Result;

/// Resolved secrets destined for an `.env` file.
///
/// Entries are written in the order given; callers pass key-sorted pairs so
/// the output is deterministic for a fixed store state.
pub struct EnvFile {
    entries: Vec<(String, Zeroizing<String>)>,
    path: PathBuf,
}

impl EnvFile {
    /// Create from key-value pairs.
    pub fn from_pairs(entries: Vec<(String, Zeroizing<String>)>, path: impl Into<PathBuf>) -> Self {
        Self {
            entries,
            path: path.into(),
        }
    }

    /// Write the file.
    ///
    /// Content goes to a temporary file in the target directory which is then
    /// renamed over the target, so a failure never leaves a partial file.
    /// The file is readable by the owner only on Unix.
    pub fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let content = Zeroizing::new(self.to_env_string());
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))?;
        }

        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "env file written");

        Ok(())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize to .env format.
    ///
    /// Values containing whitespace or .env-special characters are double
    /// quoted and escaped.
    fn to_env_string(&self) -> String {
        let mut output = String::new();

        for (key, value) in &self.entries {
            if needs_quotes(value) {
                output.push_str(&format!("{}=\"{}\"\n", key, escape_env_value(value)));
            } else {
                output.push_str(&format!("{}={}\n", key, value.as_str()));
            }
        }

        output
    }
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control())
        || value.contains('#')
        || value.contains('=')
        || value.contains('"')
        || value.contains('\'')
        || value.contains('\\')
}

fn escape_env_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(ch),
        }
    }

    escaped
}

impl std::fmt::Display for EnvFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_env_string())
    }
}
