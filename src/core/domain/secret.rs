//! Secret record types.
//!
//! A [`SecretRecord`] is one stored version of a key in one scope.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::project::ProjectId;
use crate::core::types::{EncryptedValue, RecordId, SecretKey, Version};

/// Where a secret applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Shared by every project.
    Global,
    /// Only visible from one project.
    Project(ProjectId),
}

impl Scope {
    /// `Global` if `global`, otherwise the given project.
    pub fn select(global: bool, project: &ProjectId) -> Self {
        if global {
            Scope::Global
        } else {
            Scope::Project(project.clone())
        }
    }

    /// Scope discriminator as stored.
    pub fn kind(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Project(_) => "project",
        }
    }

    /// Project column value; empty for the global scope.
    pub fn project(&self) -> &str {
        match self {
            Scope::Global => "",
            Scope::Project(id) => id.as_str(),
        }
    }

    /// Whether this is the global scope.
    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Project(id) => write!(f, "project {}", id),
        }
    }
}

/// Lifecycle state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The current version for its key and scope.
    Active,
    /// Superseded by a later version.
    Deprecated,
}

impl Status {
    /// Status as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Deprecated => "deprecated",
        }
    }

    /// Parse a stored status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Status::Active),
            "deprecated" => Some(Status::Deprecated),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored version of a secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    pub id: RecordId,
    pub key: SecretKey,
    pub scope: Scope,
    pub version: Version,
    pub status: Status,
    pub ciphertext: EncryptedValue,
    pub created_at: DateTime<Utc>,
}

impl SecretRecord {
    /// Whether this is the current version.
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}

impl std::fmt::Display for SecretRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{} ({}, {})", self.key, self.version, self.scope, self.status)
    }
}

/// Version metadata without ciphertext, for history listings.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: Version,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

impl From<&SecretRecord> for VersionInfo {
    fn from(record: &SecretRecord) -> Self {
        Self {
            version: record.version,
            status: record.status,
            created_at: record.created_at,
        }
    }
}
