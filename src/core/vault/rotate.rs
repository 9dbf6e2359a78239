//! Store key rotation.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::{check_key, Vault};
use crate::core::cipher;
use crate::core::keys::{KeySource, StoreKey};
use crate::core::store::meta;
use crate::core::types::KeyId;
use crate::error::{CipherError, Result};

/// Outcome of [`Vault::rotate`].
#[derive(Debug, Clone, Serialize)]
pub struct Rotation {
    /// Number of records re-encrypted.
    pub records: usize,
    pub previous: KeyId,
    pub current: KeyId,
    /// Key file now holding the new key, if the old key came from one.
    pub key_file: Option<PathBuf>,
    /// Where the previous key file was archived.
    pub archived: Option<PathBuf>,
}

impl Vault {
    /// Re-encrypt every record under `new_key`, or a freshly generated key.
    ///
    /// All records are re-encrypted in one transaction; if any record fails
    /// the store is left under the old key. When the current key came from
    /// the key file, the new key is staged beside it inside that transaction
    /// and moved into place after the commit, with the old key archived.
    ///
    /// # Errors
    ///
    /// Returns `CipherError` if there is no current key, it does not match
    /// the store, the new key equals the current one, or any record fails
    /// to decrypt.
    pub fn rotate(&mut self, new_key: Option<StoreKey>) -> Result<Rotation> {
        let old = self.key.as_ref().ok_or_else(|| self.no_key())?;
        let new = new_key.unwrap_or_else(StoreKey::generate);
        let previous = old.id();
        let current = new.id();

        if previous == current {
            return Err(CipherError::InvalidKey(
                "new key is the same as the current key".to_string(),
            )
            .into());
        }

        let source = old.source().clone();
        let key_file = &self.key_file;

        let (records, staged) = self.db.write(|r| {
            check_key(r, old, true)?;

            // Staged under the write lock, so no other rotation can replace it.
            let staged = match &source {
                KeySource::File(_) => Some(key_file.stage(&new)?),
                _ => None,
            };

            let records = r.all_records()?;
            for record in &records {
                let ciphertext = cipher::reencrypt(&record.ciphertext, old.as_age(), new.as_age())?;
                r.replace_ciphertext(record.id, &ciphertext)?;
            }

            r.set_meta(meta::KEY_ID, &current)?;
            r.set_meta(meta::ROTATED_AT, &Utc::now().to_rfc3339())?;
            Ok((records.len(), staged))
        })?;

        let (key_file, archived) = match staged {
            Some(mut staged) => {
                // The store is now encrypted under the staged key.
                staged.persist();
                // The swap runs under the write lock too, serialized with
                // recovery in `Vault::open`.
                let archived = self.db.write(|_| staged.commit())?;
                (Some(key_file.path().to_path_buf()), archived)
            }
            None => (None, None),
        };

        let new_source = match source {
            KeySource::File(path) => KeySource::File(path),
            KeySource::Env => {
                warn!("store key came from the environment; update KRYPTOS_ENCRYPTION_KEY");
                KeySource::Supplied
            }
            KeySource::Supplied => KeySource::Supplied,
        };
        self.key = Some(new.with_source(new_source));

        info!(records, %previous, %current, "store key rotated");
        Ok(Rotation {
            records,
            previous,
            current,
            key_file,
            archived,
        })
    }
}
