//! SQLite record store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, trace};

use super::{meta, schema, Records};
use crate::core::constants;
use crate::core::domain::{Scope, SecretRecord, Status};
use crate::core::project::ProjectId;
use crate::core::types::{RecordId, Version};
use crate::error::{Result, StoreError};

/// An open store.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

impl Database {
    /// Open or create the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Open` if the file cannot be opened, or
    /// `StoreError::UnsupportedSchema` if it was written by a newer version.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        debug!(path = %path.display(), "opening store");
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.busy_timeout(Duration::from_millis(constants::BUSY_TIMEOUT_MS))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(schema::SCHEMA)?;

        let mut db = Self { conn, path };
        db.write(|records| {
            match records.meta(meta::SCHEMA_VERSION)? {
                None => {
                    records.set_meta(meta::SCHEMA_VERSION, &constants::SCHEMA_VERSION.to_string())?;
                    records.set_meta(meta::CREATED_AT, &Utc::now().to_rfc3339())?;
                }
                Some(found) => {
                    let found: i64 = found.parse().unwrap_or(i64::MAX);
                    if found > constants::SCHEMA_VERSION {
                        return Err(StoreError::UnsupportedSchema {
                            found,
                            supported: constants::SCHEMA_VERSION,
                        }
                        .into());
                    }
                }
            }
            Ok(())
        })?;

        Ok(db)
    }

    /// Path of the database file; `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` inside a write transaction.
    ///
    /// Commits if `f` succeeds, rolls back otherwise.
    pub fn write<T>(&mut self, f: impl FnOnce(&dyn Records) -> Result<T>) -> Result<T> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&SqliteRecords::new(&tx))?;
        tx.commit()?;
        trace!("write transaction committed");
        Ok(out)
    }

    /// Run `f` against one consistent snapshot.
    pub fn read<T>(&mut self, f: impl FnOnce(&dyn Records) -> Result<T>) -> Result<T> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Deferred)?;
        let out = f(&SqliteRecords::new(&tx))?;
        tx.commit()?;
        Ok(out)
    }
}

/// [`Records`] over one SQLite transaction.
pub struct SqliteRecords<'a> {
    conn: &'a Connection,
}

const RECORD_COLUMNS: &str = "id, key, scope, project, version, status, ciphertext, created_at";

impl<'a> SqliteRecords<'a> {
    fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn next_version(&self, key: &str, scope: &Scope) -> Result<Version> {
        // Seed from existing rows so stores that predate the sequence table
        // still continue from their highest version.
        self.conn.execute(
            "INSERT INTO sequences (key, scope, project, last_version)
             VALUES (?1, ?2, ?3, 1 + COALESCE(
                 (SELECT MAX(version) FROM secrets WHERE key = ?1 AND scope = ?2 AND project = ?3), 0))
             ON CONFLICT (key, scope, project) DO UPDATE SET last_version = last_version + 1",
            params![key, scope.kind(), scope.project()],
        )?;

        let version = self.conn.query_row(
            "SELECT last_version FROM sequences WHERE key = ?1 AND scope = ?2 AND project = ?3",
            params![key, scope.kind(), scope.project()],
            |row| row.get(0),
        )?;
        Ok(version)
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<SecretRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let raw = stmt
            .query_map(params, RawRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter().map(RawRecord::into_record).collect()
    }
}

impl Records for SqliteRecords<'_> {
    fn insert(&self, key: &str, scope: &Scope, ciphertext: &str) -> Result<SecretRecord> {
        let version = self.next_version(key, scope)?;
        let created_at = Utc::now();

        let demoted = self.conn.execute(
            "UPDATE secrets SET status = 'deprecated'
             WHERE key = ?1 AND scope = ?2 AND project = ?3 AND status = 'active'",
            params![key, scope.kind(), scope.project()],
        )?;

        self.conn.execute(
            "INSERT INTO secrets (key, scope, project, version, status, ciphertext, created_at)
             VALUES (?1, ?2, ?3, ?4, 'active', ?5, ?6)",
            params![
                key,
                scope.kind(),
                scope.project(),
                version,
                ciphertext,
                created_at.to_rfc3339()
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        debug!(key, scope = %scope, version, demoted, "record inserted");

        Ok(SecretRecord {
            id,
            key: key.to_string(),
            scope: scope.clone(),
            version,
            status: Status::Active,
            ciphertext: ciphertext.to_string(),
            created_at,
        })
    }

    fn list_versions(&self, key: &str, scope: &Scope) -> Result<Vec<SecretRecord>> {
        self.query(
            &format!(
                "SELECT {} FROM secrets WHERE key = ?1 AND scope = ?2 AND project = ?3
                 ORDER BY version DESC",
                RECORD_COLUMNS
            ),
            params![key, scope.kind(), scope.project()],
        )
    }

    fn active(&self, key: &str, scope: &Scope) -> Result<Option<SecretRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM secrets
             WHERE key = ?1 AND scope = ?2 AND project = ?3 AND status = 'active'",
            RECORD_COLUMNS
        ))?;
        let raw = stmt
            .query_row(params![key, scope.kind(), scope.project()], RawRecord::from_row)
            .optional()?;
        raw.map(RawRecord::into_record).transpose()
    }

    fn list_active(&self, scope: &Scope) -> Result<BTreeMap<String, SecretRecord>> {
        let records = self.query(
            &format!(
                "SELECT {} FROM secrets
                 WHERE scope = ?1 AND project = ?2 AND status = 'active' ORDER BY key",
                RECORD_COLUMNS
            ),
            params![scope.kind(), scope.project()],
        )?;
        Ok(records.into_iter().map(|r| (r.key.clone(), r)).collect())
    }

    fn keys(&self, scope: &Scope) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT key FROM secrets WHERE scope = ?1 AND project = ?2 ORDER BY key",
        )?;
        let keys = stmt
            .query_map(params![scope.kind(), scope.project()], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    fn delete_active(&self, key: &str, scope: &Scope) -> Result<Option<Version>> {
        let deleted = self.conn.execute(
            "DELETE FROM secrets
             WHERE key = ?1 AND scope = ?2 AND project = ?3 AND status = 'active'",
            params![key, scope.kind(), scope.project()],
        )?;
        if deleted == 0 {
            return Ok(None);
        }

        let promoted: Option<(RecordId, Version)> = self
            .conn
            .query_row(
                "SELECT id, version FROM secrets
                 WHERE key = ?1 AND scope = ?2 AND project = ?3
                 ORDER BY version DESC LIMIT 1",
                params![key, scope.kind(), scope.project()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        if let Some((id, version)) = promoted {
            self.conn.execute(
                "UPDATE secrets SET status = 'active' WHERE id = ?1",
                params![id],
            )?;
            debug!(key, scope = %scope, version, "promoted previous version");
            return Ok(Some(version));
        }

        debug!(key, scope = %scope, "deleted last version");
        Ok(None)
    }

    fn delete_deprecated(&self, key: &str, scope: &Scope, keep: usize) -> Result<usize> {
        let keep = i64::try_from(keep).unwrap_or(i64::MAX);
        let deleted = self.conn.execute(
            "DELETE FROM secrets
             WHERE key = ?1 AND scope = ?2 AND project = ?3 AND status = 'deprecated'
               AND id NOT IN (
                   SELECT id FROM secrets
                   WHERE key = ?1 AND scope = ?2 AND project = ?3 AND status = 'deprecated'
                   ORDER BY version DESC LIMIT ?4
               )",
            params![key, scope.kind(), scope.project(), keep],
        )?;
        debug!(key, scope = %scope, keep, deleted, "pruned deprecated versions");
        Ok(deleted)
    }

    fn all_records(&self) -> Result<Vec<SecretRecord>> {
        self.query(
            &format!("SELECT {} FROM secrets ORDER BY id", RECORD_COLUMNS),
            [],
        )
    }

    fn replace_ciphertext(&self, id: RecordId, ciphertext: &str) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE secrets SET ciphertext = ?1 WHERE id = ?2",
            params![ciphertext, id],
        )?;
        if updated != 1 {
            return Err(StoreError::CorruptRecord {
                id,
                reason: "record disappeared during update".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn count_records(&self, scope: Option<&Scope>) -> Result<u64> {
        let count: i64 = match scope {
            Some(scope) => self.conn.query_row(
                "SELECT COUNT(*) FROM secrets WHERE scope = ?1 AND project = ?2",
                params![scope.kind(), scope.project()],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM secrets", [], |row| row.get(0))?,
        };
        Ok(count.max(0) as u64)
    }

    fn count_keys(&self) -> Result<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT key) FROM secrets", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn meta(&self, name: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_meta(&self, name: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO meta (name, value) VALUES (?1, ?2)
             ON CONFLICT (name) DO UPDATE SET value = excluded.value",
            params![name, value],
        )?;
        Ok(())
    }
}

/// A row as stored, before its text columns are interpreted.
struct RawRecord {
    id: RecordId,
    key: String,
    scope: String,
    project: String,
    version: Version,
    status: String,
    ciphertext: String,
    created_at: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            key: row.get(1)?,
            scope: row.get(2)?,
            project: row.get(3)?,
            version: row.get(4)?,
            status: row.get(5)?,
            ciphertext: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_record(self) -> Result<SecretRecord> {
        let corrupt = |reason: String| StoreError::CorruptRecord {
            id: self.id,
            reason,
        };

        let scope = match self.scope.as_str() {
            "global" => Scope::Global,
            "project" => Scope::Project(
                ProjectId::new(self.project.clone())
                    .map_err(|_| corrupt(format!("invalid project '{}'", self.project)))?,
            ),
            other => return Err(corrupt(format!("unknown scope '{}'", other)).into()),
        };

        let status = Status::parse(&self.status)
            .ok_or_else(|| corrupt(format!("unknown status '{}'", self.status)))?;

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| corrupt(format!("invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(SecretRecord {
            id: self.id,
            key: self.key,
            scope,
            version: self.version,
            status,
            ciphertext: self.ciphertext,
            created_at,
        })
    }
}
