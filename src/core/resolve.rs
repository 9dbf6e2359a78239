//! Resolution of effective values.
//!
//! A key can have an active record in the global scope and one in the
//! current project's scope. The project record always wins, so a project can
//! shadow a shared default. Selection is pure over records; decryption is
//! applied to the winners only.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;
use zeroize::Zeroizing;

use crate::core::cipher;
use crate::core::domain::{Scope, SecretRecord};
use crate::core::keys::StoreKey;
use crate::core::project::ProjectId;
use crate::core::store::Records;
use crate::core::types::{SecretKey, Version};
use crate::error::{CipherError, Result, SecretError};

/// A decrypted effective value.
#[derive(Debug)]
pub struct Resolved {
    pub key: SecretKey,
    pub scope: Scope,
    pub version: Version,
    pub value: Zeroizing<String>,
}

/// A key whose effective record could not be decrypted.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub key: SecretKey,
    #[serde(serialize_with = "serialize_scope")]
    pub scope: Scope,
    pub error: String,
}

fn serialize_scope<S: serde::Serializer>(scope: &Scope, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(scope.kind())
}

/// Every effective value for a project.
///
/// Both lists are sorted by key. A failed key never appears in `resolved`.
#[derive(Debug, Default)]
pub struct Resolution {
    pub resolved: Vec<Resolved>,
    pub failed: Vec<Failure>,
}

impl Resolution {
    /// Whether every key decrypted.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Successful `(key, value)` pairs in key order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.resolved
            .iter()
            .map(|r| (r.key.as_str(), r.value.as_str()))
    }

    /// Successful pairs as an owned, key-sorted map.
    pub fn into_map(self) -> BTreeMap<SecretKey, Zeroizing<String>> {
        self.resolved.into_iter().map(|r| (r.key, r.value)).collect()
    }
}

/// The effective record among a global and a project candidate.
pub fn select<'r>(
    global: Option<&'r SecretRecord>,
    project: Option<&'r SecretRecord>,
) -> Option<&'r SecretRecord> {
    project.or(global)
}

/// Merge active records of both scopes; project entries replace global ones.
pub fn merge(
    global: BTreeMap<SecretKey, SecretRecord>,
    project: BTreeMap<SecretKey, SecretRecord>,
) -> BTreeMap<SecretKey, SecretRecord> {
    let mut merged = global;
    merged.extend(project);
    merged
}

/// Resolve and decrypt one key.
///
/// # Errors
///
/// Returns `SecretError::NotFound` if neither scope has an active record,
/// or a `CipherError` if the effective record does not decrypt.
pub fn resolve(
    records: &dyn Records,
    key: &StoreKey,
    name: &str,
    project: &ProjectId,
) -> Result<Resolved> {
    let global = records.active(name, &Scope::Global)?;
    let local = records.active(name, &Scope::Project(project.clone()))?;

    let record = select(global.as_ref(), local.as_ref()).ok_or_else(|| {
        SecretError::not_found(name, format!("project {} or global", project))
    })?;

    open(record, key)
}

/// Resolve and decrypt every key visible from `project`.
///
/// Decryption failures are collected per key instead of aborting.
pub fn resolve_all(
    records: &dyn Records,
    key: &StoreKey,
    project: &ProjectId,
) -> Result<Resolution> {
    let global = records.list_active(&Scope::Global)?;
    let local = records.list_active(&Scope::Project(project.clone()))?;

    let mut resolution = Resolution::default();
    for (name, record) in merge(global, local) {
        match open(&record, key) {
            Ok(resolved) => resolution.resolved.push(resolved),
            Err(e) => {
                warn!(key = %name, scope = %record.scope, "failed to decrypt");
                resolution.failed.push(Failure {
                    key: name,
                    scope: record.scope,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(resolution)
}

/// Decrypt one record into a UTF-8 value.
pub fn open(record: &SecretRecord, key: &StoreKey) -> Result<Resolved> {
    let bytes = cipher::decrypt(&record.ciphertext, key.as_age())?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|_| CipherError::InvalidUtf8(record.key.clone()))?;

    Ok(Resolved {
        key: record.key.clone(),
        scope: record.scope.clone(),
        version: record.version,
        value: Zeroizing::new(text.to_string()),
    })
}
