//! Rotate command - replace the store key and re-encrypt every secret.

use tracing::info;

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::keys::{KeySource, StoreKey};
use crate::error::Result;

/// Execute key rotation.
pub fn execute(ctx: &Context, encryption_key: Option<String>) -> Result<()> {
    info!("starting key rotation");
    let mut vault = ctx.open_vault()?;

    let new_key = encryption_key
        .as_deref()
        .map(|material| StoreKey::parse(material, KeySource::Supplied))
        .transpose()?;
    let supplied = new_key.is_some();

    let rotation = vault.rotate(new_key)?;

    output::success(&format!("re-encrypted {} record(s)", rotation.records));
    output::kv("previous key:", &rotation.previous);
    output::kv("current key: ", &rotation.current);

    match (&rotation.key_file, &rotation.archived) {
        (Some(path), archived) => {
            output::kv("key file:    ", output::path(&path.display().to_string()));
            if let Some(archived) = archived {
                output::kv("archived:    ", output::path(&archived.display().to_string()));
            }
        }
        (None, _) => {
            output::warn("the store key is not kept in a key file");
            if !supplied {
                if let Some(key) = vault.key() {
                    output::raw(key.expose().as_str());
                }
            }
            output::hint("update KRYPTOS_ENCRYPTION_KEY with the new key before the next command");
        }
    }

    Ok(())
}
