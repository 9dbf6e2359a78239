//! Record store.
//!
//! Versioned secret records behind the [`Records`] trait. A backend hands
//! callers a `&dyn Records` bound to one transaction through
//! [`Database::write`] or [`Database::read`]:
//!
//! - `write` takes the store's write lock up front so two invocations
//!   cannot interleave their read-modify-write steps. The transaction
//!   commits only if the closure returns `Ok`; any error rolls everything
//!   back.
//! - `read` sees one snapshot for the whole closure (never half of a
//!   rotation).
//!
//! SQLite is the only backend (`sqlite.rs`).

mod schema;
mod sqlite;

use std::collections::BTreeMap;

use crate::core::domain::{Scope, SecretRecord};
use crate::core::types::{RecordId, Version};
use crate::error::Result;

pub use schema::meta;
pub use sqlite::{Database, SqliteRecords};

/// Record operations bound to one transaction.
pub trait Records {
    /// Insert a new active version for `(key, scope)`.
    ///
    /// Assigns the next version number, demotes the previous active record
    /// and inserts the new one. Version numbers come from a per-pair
    /// sequence that survives deletion, so they are never reused.
    fn insert(&self, key: &str, scope: &Scope, ciphertext: &str) -> Result<SecretRecord>;

    /// All versions of `(key, scope)`, newest first.
    fn list_versions(&self, key: &str, scope: &Scope) -> Result<Vec<SecretRecord>>;

    /// The active record of `(key, scope)`, if any.
    fn active(&self, key: &str, scope: &Scope) -> Result<Option<SecretRecord>>;

    /// Active records in `scope`, keyed by name.
    fn list_active(&self, scope: &Scope) -> Result<BTreeMap<String, SecretRecord>>;

    /// Distinct key names with at least one record in `scope`.
    fn keys(&self, scope: &Scope) -> Result<Vec<String>>;

    /// Delete the active record of `(key, scope)` and promote the newest
    /// remaining version, if any.
    ///
    /// Returns the version that was promoted, or `None` when nothing was
    /// left to promote. Returns `Ok(None)` as well when there was no active
    /// record to delete; use [`Records::active`] first to tell them apart.
    fn delete_active(&self, key: &str, scope: &Scope) -> Result<Option<Version>>;

    /// Delete deprecated versions of `(key, scope)` beyond the `keep` most
    /// recent ones. Never touches the active record.
    ///
    /// Returns the number of records deleted.
    fn delete_deprecated(&self, key: &str, scope: &Scope, keep: usize) -> Result<usize>;

    /// Every record in the store, in insertion order.
    fn all_records(&self) -> Result<Vec<SecretRecord>>;

    /// Replace the ciphertext of one record in place.
    ///
    /// Key, scope, version and status are left untouched.
    fn replace_ciphertext(&self, id: RecordId, ciphertext: &str) -> Result<()>;

    /// Number of records, optionally limited to one scope.
    fn count_records(&self, scope: Option<&Scope>) -> Result<u64>;

    /// Number of distinct key names across all scopes.
    fn count_keys(&self) -> Result<u64>;

    /// Read a metadata value.
    fn meta(&self, name: &str) -> Result<Option<String>>;

    /// Write a metadata value.
    fn set_meta(&self, name: &str, value: &str) -> Result<()>;
}
