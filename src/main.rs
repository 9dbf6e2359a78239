//! Kryptos - a versioned, encrypted store for environment secrets.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kryptos::cli::output;
use kryptos::cli::{execute, Cli};
use kryptos::core::constants;
use kryptos::error::{CipherError, ConfigError, Error};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(constants::ENV_LOG).unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("kryptos=debug")
        } else {
            EnvFilter::new("kryptos=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    if let Err(e) = execute(cli) {
        output::error(&e.to_string());
        if let Some(hint) = hint(&e) {
            output::hint(hint);
        }
        std::process::exit(e.exit_code());
    }
}

/// Suggestion for common failures.
fn hint(e: &Error) -> Option<&'static str> {
    match e {
        Error::Cipher(CipherError::NoKey(_)) => {
            Some("set KRYPTOS_ENCRYPTION_KEY or restore the key file from a backup")
        }
        Error::Cipher(CipherError::KeyMismatch { .. }) => {
            Some("this store was encrypted with a different key; check KRYPTOS_ENCRYPTION_KEY")
        }
        Error::Cipher(CipherError::AuthenticationFailed(_)) => {
            Some("the stored value was not encrypted with the current key or was modified")
        }
        Error::Secret(_) => Some("list available secrets with: kryptos cat"),
        Error::Config(ConfigError::Parse(_)) => Some("check ~/.kryptos/config.toml"),
        _ => None,
    }
}
