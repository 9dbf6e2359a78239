//! Secret operations: set, remove, lookup, listing, export and pruning.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::{check_key, Vault};
use crate::core::cipher;
use crate::core::domain::{EnvFile, Scope, SecretRecord, VersionInfo};
use crate::core::resolve::{self, Failure, Resolution, Resolved};
use crate::core::types::Version;
use crate::core::validation::validate_key;
use crate::error::{Result, SecretError};

/// Outcome of [`Vault::remove`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Removal {
    /// Whether the active record was deleted.
    pub removed_active: bool,
    /// Version promoted to active after the active record was deleted.
    pub promoted: Option<Version>,
    /// Number of deprecated records deleted.
    pub deleted: usize,
}

/// Outcome of [`Vault::prune`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Keys examined in the scope.
    pub keys: usize,
    /// Number of active records deleted.
    pub removed_active: usize,
    /// Number of deprecated records deleted.
    pub deleted: usize,
}

/// Outcome of [`Vault::dump`].
#[derive(Debug)]
pub struct DumpReport {
    pub path: PathBuf,
    pub written: usize,
    pub failed: Vec<Failure>,
}

impl Vault {
    /// Store a new version of `key`.
    ///
    /// The new record becomes active and the previous active record, if any,
    /// is deprecated in the same transaction. The first write to an unkeyed
    /// store generates and saves a key.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a malformed key, or
    /// `CipherError` if no usable key is available.
    pub fn set(&mut self, key: &str, value: &str, global: bool) -> Result<SecretRecord> {
        validate_key(key)?;
        self.ensure_key()?;

        let store_key = self.key.as_ref().ok_or_else(|| self.no_key())?;
        let scope = Scope::select(global, &self.project);
        let ciphertext = cipher::encrypt(value.as_bytes(), store_key.as_age())?;

        let record = self.db.write(|r| {
            check_key(r, store_key, true)?;
            r.insert(key, &scope, &ciphertext)
        })?;

        info!(key, scope = %scope, version = record.version, "secret set");
        Ok(record)
    }

    /// Remove versions of `key` from one scope.
    ///
    /// Deprecated versions are always deleted. With `include_current` the
    /// active record is deleted first and the newest older version promoted,
    /// so the promoted record survives.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::NotFound` if the scope has no record of `key`.
    pub fn remove(&mut self, key: &str, include_current: bool, global: bool) -> Result<Removal> {
        validate_key(key)?;
        let scope = Scope::select(global, &self.project);

        let removal = self.db.write(|r| {
            if r.list_versions(key, &scope)?.is_empty() {
                return Err(SecretError::not_found(key, &scope).into());
            }

            let mut removal = Removal::default();
            if include_current && r.active(key, &scope)?.is_some() {
                removal.removed_active = true;
                removal.promoted = r.delete_active(key, &scope)?;
            }
            removal.deleted = r.delete_deprecated(key, &scope, 0)?;
            Ok(removal)
        })?;

        info!(key, scope = %scope, ?removal, "secret removed");
        Ok(removal)
    }

    /// Effective decrypted value of `key`.
    ///
    /// The current project's record shadows the global one.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::NotFound` if neither scope holds `key`, or
    /// `CipherError` if it cannot be decrypted.
    pub fn grep(&mut self, key: &str) -> Result<Resolved> {
        validate_key(key)?;
        let project = &self.project;

        let Some(store_key) = self.key.as_ref() else {
            let no_key = self.no_key();
            return self.db.read(|r| {
                let global = r.active(key, &Scope::Global)?;
                let local = r.active(key, &Scope::Project(project.clone()))?;
                match resolve::select(global.as_ref(), local.as_ref()) {
                    Some(_) => Err(no_key.into()),
                    None => {
                        Err(SecretError::not_found(key, format!("project {} or global", project))
                            .into())
                    }
                }
            });
        };

        self.db.read(|r| {
            check_key(r, store_key, false)?;
            resolve::resolve(r, store_key, key, project)
        })
    }

    /// Every effective value visible from the current project, key-sorted.
    ///
    /// Keys that fail to decrypt are reported in [`Resolution::failed`]
    /// instead of failing the whole listing.
    pub fn cat(&mut self) -> Result<Resolution> {
        let project = &self.project;

        let Some(store_key) = self.key.as_ref() else {
            if self.db.read(|r| r.count_records(None))? == 0 {
                return Ok(Resolution::default());
            }
            return Err(self.no_key().into());
        };

        let resolution = self.db.read(|r| {
            check_key(r, store_key, false)?;
            resolve::resolve_all(r, store_key, project)
        })?;

        debug!(
            resolved = resolution.resolved.len(),
            failed = resolution.failed.len(),
            "listed secrets"
        );
        Ok(resolution)
    }

    /// Write every effective value to an env file at `path`.
    ///
    /// Keys that fail to decrypt are left out of the file and returned in
    /// the report.
    pub fn dump(&mut self, path: &Path) -> Result<DumpReport> {
        let resolution = self.cat()?;
        let failed = resolution.failed.clone();

        let entries = resolution.into_map().into_iter().collect();
        let file = EnvFile::from_pairs(entries, path);
        file.save()?;

        info!(path = %path.display(), written = file.len(), failed = failed.len(), "dumped secrets");
        Ok(DumpReport {
            path: path.to_path_buf(),
            written: file.len(),
            failed,
        })
    }

    /// Trim history in one scope.
    ///
    /// For every key the `offset` most recent deprecated versions are kept.
    /// With `include_current` the active record is deleted first and the
    /// next version promoted, as [`Vault::remove`] does.
    pub fn prune(&mut self, offset: usize, include_current: bool, global: bool) -> Result<PruneReport> {
        let scope = Scope::select(global, &self.project);

        let report = self.db.write(|r| {
            let keys = r.keys(&scope)?;
            let mut report = PruneReport {
                keys: keys.len(),
                ..Default::default()
            };

            for key in &keys {
                if include_current && r.active(key, &scope)?.is_some() {
                    r.delete_active(key, &scope)?;
                    report.removed_active += 1;
                }
                report.deleted += r.delete_deprecated(key, &scope, offset)?;
            }
            Ok(report)
        })?;

        info!(scope = %scope, offset, ?report, "pruned secrets");
        Ok(report)
    }

    /// Versions of `key` in one scope, newest first. Values are not
    /// decrypted.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::NotFound` if the scope has no record of `key`.
    pub fn history(&mut self, key: &str, global: bool) -> Result<Vec<VersionInfo>> {
        validate_key(key)?;
        let scope = Scope::select(global, &self.project);

        let versions = self.db.read(|r| r.list_versions(key, &scope))?;
        if versions.is_empty() {
            return Err(SecretError::not_found(key, &scope).into());
        }
        Ok(versions.iter().map(VersionInfo::from).collect())
    }
}
