//! Store schema.
//!
//! The global scope stores an empty project string so the uniqueness
//! constraints never see NULLs.

/// Tables and indexes, idempotent.
pub(super) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS secrets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL,
    scope TEXT NOT NULL CHECK (scope IN ('global', 'project')),
    project TEXT NOT NULL DEFAULT '',
    version INTEGER NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('active', 'deprecated')),
    ciphertext TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (key, scope, project, version)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_secrets_one_active
    ON secrets(key, scope, project) WHERE status = 'active';
CREATE INDEX IF NOT EXISTS idx_secrets_scope ON secrets(scope, project, key);

CREATE TABLE IF NOT EXISTS sequences (
    key TEXT NOT NULL,
    scope TEXT NOT NULL,
    project TEXT NOT NULL DEFAULT '',
    last_version INTEGER NOT NULL,
    PRIMARY KEY (key, scope, project)
);

CREATE TABLE IF NOT EXISTS meta (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Metadata names.
pub mod meta {
    pub const SCHEMA_VERSION: &str = "schema_version";
    pub const KEY_ID: &str = "key_id";
    pub const ROTATED_AT: &str = "rotated_at";
    pub const CREATED_AT: &str = "created_at";
}
