//! Error types.
//!
//! Each concern has its own enum; [`Error`] aggregates them so every
//! fallible function in the crate can return [`Result`].

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// `NotFound` and crypto failures get distinct codes so scripts can tell
    /// a missing key from a broken store.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) => 2,
            Error::Secret(SecretError::NotFound { .. }) => 3,
            Error::Cipher(_) => 4,
            _ => 1,
        }
    }

    /// Whether this is a "key not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Secret(SecretError::NotFound { .. }))
    }
}

/// Encryption, decryption and key material failures.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// The ciphertext was not produced under the given key or was tampered with.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("armor encoding failed: {0}")]
    ArmorFailed(String),

    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("no encryption key available (set KRYPTOS_ENCRYPTION_KEY or create {0})")]
    NoKey(String),

    /// The supplied key does not match the key the store was encrypted with.
    #[error("encryption key {actual} does not match store key {expected}")]
    KeyMismatch { expected: String, actual: String },

    #[error("decrypted value for {0} is not valid UTF-8")]
    InvalidUtf8(String),
}

/// Persistence failures: database and key files.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to open store at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("store schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i64, supported: i64 },

    #[error("corrupt record {id}: {reason}")]
    CorruptRecord { id: i64, reason: String },

    #[error("failed to read key file: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("failed to write key file: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("staged key {0} was replaced before it could be installed")]
    StagedKeyLost(String),
}

/// Secret lookup failures.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("secret not found: {key} ({scope})")]
    NotFound { key: String, scope: String },
}

impl SecretError {
    /// Build a not-found error for a key in a described scope.
    pub fn not_found(key: impl Into<String>, scope: impl std::fmt::Display) -> Self {
        SecretError::NotFound {
            key: key.into(),
            scope: scope.to_string(),
        }
    }
}

/// Input rejected before the store is touched.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("secret key cannot be empty")]
    EmptyKey,

    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid project id '{0}': must be non-empty and contain no whitespace")]
    InvalidProject(String),

    #[error("insecure permissions on {path}: expected {expected}, found {actual}")]
    InvalidPermissions {
        path: String,
        expected: String,
        actual: String,
    },
}

/// Settings and environment failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to determine home directory")]
    NoHome,

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unable to determine working directory: {0}")]
    WorkingDir(#[source] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Store(StoreError::Database(e))
    }
}
