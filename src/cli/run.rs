//! Run command.
//!
//! Executes a command with decrypted secrets injected as environment variables.

use std::process::Command;

use tracing::debug;

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::environ;
use crate::core::vault::Vault;
use crate::error::{Error, Result};

/// Run a command with secrets injected as environment variables.
pub fn execute(ctx: &Context, command: &[String]) -> Result<()> {
    let mut vault = ctx.open_vault()?;
    let exit_code = run_with_secrets(&mut vault, command)?;
    // `exit` skips destructors; close the store first.
    drop(vault);
    std::process::exit(exit_code);
}

/// Run a command with decrypted secrets as environment variables.
fn run_with_secrets(vault: &mut Vault, command: &[String]) -> Result<i32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| Error::Other("no command specified".to_string()))?;

    let resolution = vault.cat()?;
    for failure in &resolution.failed {
        output::warn(&format!("not injecting {}: {}", failure.key, failure.error));
    }

    let mut cmd = Command::new(program);
    cmd.args(args);
    let count = environ::inject(&mut cmd, resolution.pairs());
    debug!(program, count, "spawning child");

    let status = cmd
        .status()
        .map_err(|e| Error::Other(format!("failed to run {}: {}", program, e)))?;
    // Values are zeroized when `resolution` drops.
    Ok(status.code().unwrap_or(1))
}
