//! Store metadata report.

use tracing::warn;

use super::Vault;
use crate::core::domain::{Scope, StoreInfo};
use crate::core::store::meta;

impl Vault {
    /// Describe the store.
    ///
    /// Best-effort: any value that cannot be read is left empty and logged
    /// instead of failing the report.
    pub fn info(&mut self) -> StoreInfo {
        let mut info = StoreInfo {
            path: self
                .db
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string()),
            project: self.project.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            ..Default::default()
        };

        let project = Scope::Project(self.project.clone());
        let result = self.db.read(|r| {
            info.records = r.count_records(None).unwrap_or_default();
            info.keys = r.count_keys().unwrap_or_default();
            info.global_records = r.count_records(Some(&Scope::Global)).unwrap_or_default();
            info.project_records = r.count_records(Some(&project)).unwrap_or_default();
            info.key_id = r.meta(meta::KEY_ID).ok().flatten();
            info.rotated_at = r.meta(meta::ROTATED_AT).ok().flatten();
            info.schema_version = r
                .meta(meta::SCHEMA_VERSION)
                .ok()
                .flatten()
                .and_then(|v| v.parse().ok());
            Ok(())
        });

        if let Err(e) = result {
            warn!(error = %e, "store metadata unavailable");
        }

        if info.key_id.is_none() {
            info.key_id = self.key_id();
        }

        info
    }
}
