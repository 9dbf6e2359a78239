//! Info command.

use crate::cli::context::Context;
use crate::cli::output;
use crate::error::Result;

/// Show store metadata.
pub fn execute(ctx: &Context, json: bool) -> Result<()> {
    let mut vault = ctx.inspect_vault()?;
    let info = vault.info();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let none = || "-".to_string();

    output::section("Store");
    output::kv("path:          ", output::path(&info.path));
    output::kv("schema:        ", info.schema_version.map_or_else(none, |v| v.to_string()));
    output::kv("kryptos:       ", &info.tool_version);

    output::section("Secrets");
    output::kv("records:       ", info.records);
    output::kv("keys:          ", info.keys);
    output::kv("global:        ", info.global_records);
    output::kv("this project:  ", info.project_records);
    output::kv("project id:    ", &info.project);

    output::section("Encryption");
    output::kv("key id:        ", info.key_id.clone().unwrap_or_else(none));
    output::kv("rotated at:    ", info.rotated_at.clone().unwrap_or_else(none));

    Ok(())
}
