//! Secret management commands.
//!
//! Implements set, rm, grep, cat, dump, prune and history.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::resolve::Failure;
use crate::error::Result;

/// Store a new version of a secret.
pub fn set(ctx: &Context, key: &str, value: &str, global: bool) -> Result<()> {
    info!(key, global, "setting secret");
    let mut vault = ctx.open_vault()?;
    let generated = vault.key().is_none();

    let record = vault.set(key, value, global)?;

    if generated {
        output::success(&format!(
            "generated store key at {}",
            output::path(&vault.key_file().path().display().to_string())
        ));
        output::hint("back up this file; secrets cannot be recovered without it");
    }
    output::success(&format!(
        "set {} (v{}, {})",
        output::key(key),
        record.version,
        record.scope
    ));
    Ok(())
}

/// Remove old versions of a secret.
pub fn rm(ctx: &Context, key: &str, all: bool, global: bool) -> Result<()> {
    info!(key, all, global, "removing secret");
    let mut vault = ctx.open_vault()?;
    let removal = vault.remove(key, all, global)?;

    let removed = removal.deleted + usize::from(removal.removed_active);
    output::success(&format!(
        "removed {} version(s) of {}",
        removed,
        output::key(key)
    ));
    match removal.promoted {
        Some(version) => output::dimmed(&format!("v{} is now current", version)),
        None if removal.removed_active => output::dimmed("no versions left"),
        None => {}
    }
    Ok(())
}

/// Print the effective value of a secret.
pub fn grep(ctx: &Context, key: &str) -> Result<()> {
    let mut vault = ctx.open_vault()?;
    let resolved = vault.grep(key)?;
    // Plain output for scripting - no decoration
    output::raw(resolved.value.as_str());
    Ok(())
}

/// Print every effective secret for the current project.
pub fn cat(ctx: &Context, json: bool) -> Result<()> {
    let mut vault = ctx.open_vault()?;
    let resolution = vault.cat()?;

    if json {
        let secrets: BTreeMap<&str, &str> = resolution.pairs().collect();
        let result = serde_json::json!({
            "project": vault.project().as_str(),
            "secrets": secrets,
            "failed": resolution.failed,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if resolution.resolved.is_empty() && resolution.failed.is_empty() {
        output::dimmed("no secrets stored");
        return Ok(());
    }

    for (key, value) in resolution.pairs() {
        output::raw(&format!("{}={}", key, value));
    }
    report_failures(&resolution.failed);
    Ok(())
}

/// Write every effective secret to an env file.
pub fn dump(ctx: &Context, target: &Path) -> Result<()> {
    let mut vault = ctx.open_vault()?;
    let report = vault.dump(target)?;

    output::success(&format!(
        "wrote {} secret(s) to {}",
        report.written,
        output::path(&report.path.display().to_string())
    ));
    report_failures(&report.failed);
    Ok(())
}

/// Delete old versions of every secret in a scope.
pub fn prune(ctx: &Context, offset: usize, all: bool, global: bool) -> Result<()> {
    info!(offset, all, global, "pruning secrets");
    let mut vault = ctx.open_vault()?;
    let report = vault.prune(offset, all, global)?;

    if report.keys == 0 {
        output::dimmed("nothing to prune");
        return Ok(());
    }

    output::success(&format!(
        "pruned {} version(s) across {} key(s)",
        report.deleted + report.removed_active,
        report.keys
    ));
    Ok(())
}

/// List the versions of a secret.
pub fn history(ctx: &Context, key: &str, global: bool, json: bool) -> Result<()> {
    let mut vault = ctx.open_vault()?;
    let versions = vault.history(key, global)?;

    if json {
        let result = serde_json::json!({
            "key": key,
            "versions": versions,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output::section(&format!("{} ({} versions)", key, versions.len()));
    for v in &versions {
        output::list_item(&format!(
            "v{:<4} {:<10} {}",
            v.version,
            v.status.as_str(),
            v.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    Ok(())
}

fn report_failures(failed: &[Failure]) {
    for failure in failed {
        output::warn(&format!(
            "could not decrypt {} ({}): {}",
            failure.key, failure.scope, failure.error
        ));
    }
}
