//! Test support utilities for kryptos integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;

#[allow(unused_imports)]
pub use assertions::*;

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// Each test gets its own working directory and its own kryptos home
/// (`KRYPTOS_HOME`), so the store, key file and config never leak between
/// tests. Child processes use `.current_dir()` and explicit env vars, so
/// tests can safely run in parallel.
pub struct Test {
    /// Working directory of the commands (the "project")
    pub dir: TempDir,
    /// Kryptos home holding the store and key file
    pub home: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");

        Self { dir, home }
    }

    /// Create a test environment with project secrets set.
    pub fn with_secrets(secrets: &[(&str, &str)]) -> Self {
        let t = Self::new();
        for (k, v) in secrets {
            let output = t.set(k, v);
            assert!(
                output.status.success(),
                "Failed to set secret {}: {}",
                k,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        t
    }

    /// Path of the store database.
    pub fn database(&self) -> PathBuf {
        self.home.path().join("kryptos.db")
    }

    /// Path of the key file.
    pub fn key_file(&self) -> PathBuf {
        self.home.path().join("identity.key")
    }

    /// Path inside the working directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
