//! Constants used throughout kryptos.
//!
//! Centralizes file names, environment variable names and schema values.

/// Directory under HOME holding the store, key and config (~/.kryptos).
pub const HOME_DIR: &str = ".kryptos";

/// SQLite database file name inside the kryptos home.
pub const DATABASE_FILE: &str = "kryptos.db";

/// Key file name inside the kryptos home.
pub const KEY_FILE: &str = "identity.key";

/// Optional settings file inside the kryptos home.
pub const CONFIG_FILE: &str = "config.toml";

/// Directory (next to the key file) holding archived keys after rotation.
pub const KEY_ARCHIVE_DIR: &str = "archive";

/// Suffix of the staged key file written during rotation.
pub const STAGED_KEY_SUFFIX: &str = "next";

/// Default dump target.
pub const ENV_FILE: &str = ".env";

/// Overrides the kryptos home directory.
pub const ENV_HOME: &str = "KRYPTOS_HOME";

/// Overrides the database path.
pub const ENV_DATABASE: &str = "KRYPTOS_DATABASE";

/// Overrides the key file path.
pub const ENV_KEY_FILE: &str = "KRYPTOS_KEY_FILE";

/// Supplies the key material directly (AGE-SECRET-KEY-1...).
pub const ENV_ENCRYPTION_KEY: &str = "KRYPTOS_ENCRYPTION_KEY";

/// Pins the project identifier instead of detecting it.
pub const ENV_PROJECT: &str = "KRYPTOS_PROJECT";

/// Log filter directive.
pub const ENV_LOG: &str = "KRYPTOS_LOG";

/// Current store schema version.
pub const SCHEMA_VERSION: i64 = 1;

/// Busy timeout for concurrent invocations against the same store.
pub const BUSY_TIMEOUT_MS: u64 = 5_000;

/// Marker directory identifying a project root.
pub const PROJECT_MARKER: &str = ".git";

/// Hex characters kept from the project path digest.
pub const PROJECT_ID_LEN: usize = 16;
