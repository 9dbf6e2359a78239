//! The primary interface for kryptos operations.
//!
//! A [`Vault`] owns the store connection, the active key and the current
//! project id, and exposes one method per command. Every mutation runs in a
//! single store transaction, so a failure leaves the store as it was.

mod info;
mod rotate;
mod secrets;

use tracing::{debug, warn};

pub use rotate::Rotation;
pub use secrets::{DumpReport, PruneReport, Removal};

use crate::core::config::Settings;
use crate::core::keys::{self, KeyFile, KeySource, StoreKey};
use crate::core::project::ProjectId;
use crate::core::store::{meta, Database, Records};
use crate::core::types::KeyId;
use crate::error::{CipherError, Result};

/// The primary interface for kryptos operations.
pub struct Vault {
    pub(super) db: Database,
    pub(super) key: Option<StoreKey>,
    pub(super) key_file: KeyFile,
    pub(super) project: ProjectId,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("db", &self.db)
            .field("key", &self.key)
            .field("key_file", &self.key_file)
            .field("project", &self.project)
            .finish()
    }
}

impl Vault {
    /// Open the store described by `settings` for `project`.
    ///
    /// Loads the key from the environment or the key file. If the key file
    /// does not match the store but a staged key from an interrupted
    /// rotation does, the rotation is completed first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be opened, or `CipherError`
    /// if the key material is malformed.
    pub fn open(settings: &Settings, project: ProjectId) -> Result<Self> {
        let mut db = Database::open(&settings.database)?;
        let key_file = KeyFile::new(&settings.key_file);
        let mut key = keys::load(material(settings), &key_file)?;

        let stored = db.read(|r| r.meta(meta::KEY_ID))?;
        if let Some(expected) = stored {
            let mismatched = key.as_ref().map_or(true, |k| k.id() != expected);
            let from_file = key
                .as_ref()
                .map_or(true, |k| matches!(k.source(), KeySource::File(_)));
            if mismatched && from_file {
                // Re-read under the write lock; a rotation may be finishing.
                let recovered = db.write(|r| match r.meta(meta::KEY_ID)? {
                    Some(expected) => key_file.recover(&expected),
                    None => Ok(None),
                })?;
                if let Some(recovered) = recovered {
                    key = Some(recovered);
                }
            }
        }

        debug!(project = %project, key = ?key, "vault opened");
        Ok(Self::new(db, key_file, key, project))
    }

    /// Open the store for reporting only.
    ///
    /// Key material that cannot be loaded is logged and left out instead of
    /// failing the open, and an interrupted rotation is left for the next
    /// [`Vault::open`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be opened.
    pub fn inspect(settings: &Settings, project: ProjectId) -> Result<Self> {
        let db = Database::open(&settings.database)?;
        let key_file = KeyFile::new(&settings.key_file);
        let key = keys::load(material(settings), &key_file).unwrap_or_else(|e| {
            warn!(error = %e, "store key unavailable");
            None
        });

        debug!(project = %project, key = ?key, "vault opened for inspection");
        Ok(Self::new(db, key_file, key, project))
    }

    /// Assemble a vault from parts.
    pub fn new(db: Database, key_file: KeyFile, key: Option<StoreKey>, project: ProjectId) -> Self {
        Self {
            db,
            key,
            key_file,
            project,
        }
    }

    /// Current project id.
    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    /// The active key, if one is loaded.
    pub fn key(&self) -> Option<&StoreKey> {
        self.key.as_ref()
    }

    /// Identifier of the active key, if one is loaded.
    pub fn key_id(&self) -> Option<KeyId> {
        self.key.as_ref().map(StoreKey::id)
    }

    /// Key file used for generation and rotation.
    pub fn key_file(&self) -> &KeyFile {
        &self.key_file
    }

    fn no_key(&self) -> CipherError {
        CipherError::NoKey(self.key_file.path().display().to_string())
    }

    /// Load a key for writing, generating and saving one if the store has
    /// never been keyed.
    ///
    /// Generation runs under the store's write lock, so two first writes
    /// cannot each save a different key.
    fn ensure_key(&mut self) -> Result<()> {
        if self.key.is_some() {
            return Ok(());
        }

        let key_file = &self.key_file;
        let key = self.db.write(|r| {
            if let Some(expected) = r.meta(meta::KEY_ID)? {
                // Keyed by another invocation since this vault was opened.
                return key_file.recover(&expected)?.ok_or_else(|| {
                    CipherError::NoKey(key_file.path().display().to_string()).into()
                });
            }

            if !key_file.exists() {
                let key = StoreKey::generate();
                key_file.write(&key)?;
                debug!(path = %key_file.path().display(), id = %key.id(), "generated store key");
            }
            let key = key_file.load()?;
            r.set_meta(meta::KEY_ID, &key.id())?;
            Ok(key)
        })?;

        self.key = Some(key);
        Ok(())
    }
}

fn material(settings: &Settings) -> Option<&str> {
    settings.encryption_key.as_deref().map(|k| k.as_str())
}

/// Check that `key` is the key the store is encrypted under.
///
/// A store without a recorded key, or without any records, adopts `key`
/// when `adopt` is set (inside write transactions).
pub(super) fn check_key(records: &dyn Records, key: &StoreKey, adopt: bool) -> Result<()> {
    let actual = key.id();
    match records.meta(meta::KEY_ID)? {
        Some(expected) if expected == actual => Ok(()),
        Some(expected) => {
            if adopt && records.count_records(None)? == 0 {
                records.set_meta(meta::KEY_ID, &actual)?;
                return Ok(());
            }
            Err(CipherError::KeyMismatch { expected, actual }.into())
        }
        None => {
            if adopt {
                records.set_meta(meta::KEY_ID, &actual)?;
            }
            Ok(())
        }
    }
}
