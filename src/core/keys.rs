//! Store key material.
//!
//! The store is encrypted under one age x25519 identity. It comes either
//! from `KRYPTOS_ENCRYPTION_KEY` or from a key file (`~/.kryptos/identity.key`).
//!
//! Rotation swaps the key file in two steps: the new key is staged next to
//! the current one inside the store transaction, and moved into place (with
//! the old key archived) after the commit. Both steps, and
//! [`KeyFile::recover`], which completes a swap interrupted by a crash, run
//! under the store's write lock so concurrent invocations never touch the
//! key files at the same time.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use age::secrecy::ExposeSecret;
use age::x25519;
use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

use crate::core::cipher;
use crate::core::constants;
use crate::core::types::KeyId;
use crate::error::{Result, StoreError};

/// Where the active key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// `KRYPTOS_ENCRYPTION_KEY`
    Env,
    /// A key file on disk.
    File(PathBuf),
    /// Passed in directly (CLI argument, freshly generated, tests).
    Supplied,
}

/// The key every record in the store is encrypted under.
pub struct StoreKey {
    inner: x25519::Identity,
    source: KeySource,
}

impl std::fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreKey")
            .field("id", &self.id())
            .field("source", &self.source)
            .finish()
    }
}

impl StoreKey {
    /// Parse key material (`AGE-SECRET-KEY-1...`).
    ///
    /// # Errors
    ///
    /// Returns `CipherError::InvalidKey` if the material is malformed.
    pub fn parse(material: &str, source: KeySource) -> Result<Self> {
        let inner = cipher::parse_identity(material)?;
        Ok(Self { inner, source })
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self {
            inner: x25519::Identity::generate(),
            source: KeySource::Supplied,
        }
    }

    /// Public identifier of this key (its age recipient).
    ///
    /// Safe to store and display.
    pub fn id(&self) -> KeyId {
        self.inner.to_public().to_string()
    }

    /// Reference to the inner age identity.
    pub fn as_age(&self) -> &x25519::Identity {
        &self.inner
    }

    /// Where this key was loaded from.
    pub fn source(&self) -> &KeySource {
        &self.source
    }

    /// Secret key material, for writing to a key file or showing once.
    pub fn expose(&self) -> Zeroizing<String> {
        Zeroizing::new(self.inner.to_string().expose_secret().to_string())
    }

    pub(crate) fn with_source(mut self, source: KeySource) -> Self {
        self.source = source;
        self
    }
}

/// Pick the active key: explicit material wins over the key file.
///
/// Returns `None` when neither is available.
pub fn load(material: Option<&str>, file: &KeyFile) -> Result<Option<StoreKey>> {
    if let Some(material) = material.filter(|m| !m.trim().is_empty()) {
        debug!("using key from environment");
        return StoreKey::parse(material, KeySource::Env).map(Some);
    }

    if file.exists() {
        return file.load().map(Some);
    }

    debug!(path = %file.path().display(), "no key available");
    Ok(None)
}

/// A key file on disk.
#[derive(Debug, Clone)]
pub struct KeyFile {
    path: PathBuf,
}

impl KeyFile {
    /// Key file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Key file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the key file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Path of the key staged during rotation.
    pub fn staged_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| constants::KEY_FILE.into());
        name.push(".");
        name.push(constants::STAGED_KEY_SUFFIX);
        self.path.with_file_name(name)
    }

    /// Directory holding archived keys.
    pub fn archive_dir(&self) -> PathBuf {
        self.path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(constants::KEY_ARCHIVE_DIR)
    }

    /// Load the key.
    ///
    /// Logs a warning when the file is readable by others.
    pub fn load(&self) -> Result<StoreKey> {
        debug!(path = %self.path.display(), "loading key file");
        read_key(&self.path).map(|k| k.with_source(KeySource::File(self.path.clone())))
    }

    /// Write `key` to this path with owner-only permissions.
    pub fn write(&self, key: &StoreKey) -> Result<()> {
        write_key(&self.path, key, false)?;
        debug!(path = %self.path.display(), "key file written");
        Ok(())
    }

    /// Write `key` to the staged path.
    ///
    /// Must be called with the store's write lock held. A staged file found
    /// there belongs to a rotation that never committed and is discarded.
    /// The returned guard removes the staged file unless committed, and
    /// only while the file still holds `key`.
    pub fn stage(&self, key: &StoreKey) -> Result<StagedKey<'_>> {
        let staged = self.staged_path();
        if staged.exists() {
            warn!(path = %staged.display(), "discarding stale staged key");
            fs::remove_file(&staged).map_err(StoreError::WriteFailed)?;
        }

        write_key(&staged, key, true)?;
        debug!(path = %staged.display(), "key staged");
        Ok(StagedKey {
            file: self,
            id: key.id(),
            done: false,
        })
    }

    /// Finish an interrupted rotation.
    ///
    /// Must be called with the store's write lock held. Returns the key whose
    /// id equals `expected_id` (the id recorded in the store): the key file
    /// itself if it already holds that key, otherwise the staged key after
    /// moving it into place.
    pub fn recover(&self, expected_id: &str) -> Result<Option<StoreKey>> {
        if let Some(current) = key_with_id(&self.path, expected_id) {
            return Ok(Some(current.with_source(KeySource::File(self.path.clone()))));
        }

        let staged = self.staged_path();
        let Some(key) = key_with_id(&staged, expected_id) else {
            return Ok(None);
        };

        warn!(path = %staged.display(), "completing interrupted key rotation");
        self.promote_staged()?;
        Ok(Some(key.with_source(KeySource::File(self.path.clone()))))
    }

    /// Archive the current key (if any) and move the staged key into place.
    fn promote_staged(&self) -> Result<Option<PathBuf>> {
        let archived = if self.path.exists() {
            let dir = self.archive_dir();
            fs::create_dir_all(&dir).map_err(StoreError::WriteFailed)?;
            let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%f");
            let target = dir.join(format!("{}.{}", constants::KEY_FILE, timestamp));
            fs::rename(&self.path, &target).map_err(StoreError::WriteFailed)?;
            Some(target)
        } else {
            None
        };

        fs::rename(self.staged_path(), &self.path).map_err(StoreError::WriteFailed)?;
        Ok(archived)
    }
}

/// A key written to the staged path during rotation.
pub struct StagedKey<'a> {
    file: &'a KeyFile,
    id: KeyId,
    done: bool,
}

impl StagedKey<'_> {
    /// Keep the staged file even if this guard is dropped without
    /// [`commit`](Self::commit). [`KeyFile::recover`] installs it later.
    pub fn persist(&mut self) {
        self.done = true;
    }

    /// Archive the old key and move the staged key into place.
    ///
    /// Must be called with the store's write lock held. Returns the archive
    /// path of the previous key, if there was one. If another invocation
    /// already recovered the staged key, there is nothing left to do.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::StagedKeyLost` if neither the staged path nor
    /// the key file holds the staged key.
    pub fn commit(mut self) -> Result<Option<PathBuf>> {
        self.done = true;
        if key_with_id(&self.file.staged_path(), &self.id).is_some() {
            return self.file.promote_staged();
        }

        if key_with_id(&self.file.path, &self.id).is_some() {
            debug!(id = %self.id, "staged key already installed");
            return Ok(None);
        }

        Err(StoreError::StagedKeyLost(self.file.staged_path().display().to_string()).into())
    }
}

impl Drop for StagedKey<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }

        let staged = self.file.staged_path();
        if key_with_id(&staged, &self.id).is_some() {
            let _ = fs::remove_file(staged);
        }
    }
}

/// The key at `path`, if it is readable and has id `id`.
fn key_with_id(path: &Path, id: &str) -> Option<StoreKey> {
    if !path.exists() {
        return None;
    }
    read_key(path).ok().filter(|k| k.id() == id)
}

fn read_key(path: &Path) -> Result<StoreKey> {
    #[cfg(unix)]
    {
        if crate::core::validation::validate_file_permissions(path, 0o600).is_err() {
            warn!(path = %path.display(), "insecure key file permissions, expected 600");
        }
    }

    let contents = Zeroizing::new(fs::read_to_string(path).map_err(StoreError::ReadFailed)?);
    let material = contents
        .lines()
        .find(|line| !line.starts_with('#') && !line.trim().is_empty())
        .unwrap_or("");

    StoreKey::parse(material, KeySource::Supplied)
}

/// Write `key` to `path`. With `exclusive`, fail if `path` already exists.
fn write_key(path: &Path, key: &StoreKey, exclusive: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(StoreError::WriteFailed)?;
    }

    let contents = Zeroizing::new(format!(
        "# public key: {}\n{}\n",
        key.id(),
        key.expose().as_str()
    ));

    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = open_for_write(path, exclusive)
            .mode(0o600)
            .open(path)
            .map_err(StoreError::WriteFailed)?;
        file.write_all(contents.as_bytes())
            .map_err(StoreError::WriteFailed)?;
        file.sync_all().map_err(StoreError::WriteFailed)?;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(StoreError::WriteFailed)?;
    }

    #[cfg(not(unix))]
    {
        let mut file = open_for_write(path, exclusive)
            .open(path)
            .map_err(StoreError::WriteFailed)?;
        file.write_all(contents.as_bytes())
            .map_err(StoreError::WriteFailed)?;
        file.sync_all().map_err(StoreError::WriteFailed)?;
    }

    Ok(())
}

fn open_for_write(path: &Path, exclusive: bool) -> fs::OpenOptions {
    let mut options = fs::OpenOptions::new();
    options.write(true);
    if exclusive {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }
    trace!(path = %path.display(), exclusive, "opening key file for write");
    options
}
