//! Store information reported by `info`.

use serde::Serialize;

/// Metadata about a store.
///
/// Every field is best-effort: values the store does not record yet are
/// left empty rather than failing the report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreInfo {
    /// Path of the database file
    pub path: String,
    /// Total number of records, all versions and scopes
    pub records: u64,
    /// Number of distinct key names
    pub keys: u64,
    /// Records in the global scope
    pub global_records: u64,
    /// Records in the current project's scope
    pub project_records: u64,
    /// Current project identifier
    pub project: String,
    /// Public identifier of the key the store is encrypted under
    pub key_id: Option<String>,
    /// When the store key was last rotated (RFC 3339)
    pub rotated_at: Option<String>,
    /// Schema version recorded in the store
    pub schema_version: Option<i64>,
    /// Version of this tool
    pub tool_version: String,
}
