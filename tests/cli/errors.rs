//! Tests for error reporting, exit codes and CLI flags.

use crate::support::*;
use kryptos::core::cipher;
use kryptos::core::keys::StoreKey;

#[test]
fn test_help() {
    let t = Test::new();

    let output = t.kryptos(&["--help"]);
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("kryptos") || out.contains("Usage"));
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();
    assert_failure(&t.kryptos(&["unknown-command"]));
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    let output = t.kryptos(&["--version"]);
    assert_success(&output);
    assert_stdout_contains(&output, env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_missing_key_exits_3() {
    let t = Test::with_secrets(&[("PRESENT", "v")]);

    let output = t.grep("ABSENT");
    assert_code(&output, 3);
    assert_stderr_contains(&output, "secret not found: ABSENT");
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_lost_key_file_exits_4() {
    let t = Test::with_secrets(&[("A", "1")]);
    std::fs::remove_file(t.key_file()).unwrap();

    let output = t.grep("A");
    assert_code(&output, 4);
    assert_stderr_contains(&output, "no encryption key available");

    // Writing must not silently generate a second key.
    assert_code(&t.set("B", "2"), 4);
    assert!(!t.key_file().exists());
}

#[test]
fn test_foreign_key_exits_4() {
    let t = Test::with_secrets(&[("A", "1")]);
    let stranger = StoreKey::generate();

    let output = t
        .cmd()
        .env("KRYPTOS_ENCRYPTION_KEY", stranger.expose().as_str())
        .args(["set", "B", "2"])
        .output()
        .unwrap();
    assert_code(&output, 4);
    assert_stderr_contains(&output, "does not match store key");

    // Still only the original record.
    assert_eq!(t.info_json()["records"], 1);
}

#[test]
fn test_malformed_env_key_exits_4() {
    let t = Test::new();
    let output = t
        .cmd()
        .env("KRYPTOS_ENCRYPTION_KEY", "AGE-SECRET-KEY-1NOTVALID")
        .args(["set", "A", "1"])
        .output()
        .unwrap();
    assert_code(&output, 4);
}

#[test]
fn test_tampered_record_is_crypto_failure() {
    let t = Test::with_secrets(&[("GOOD", "ok"), ("BAD", "original")]);

    let stranger = StoreKey::generate();
    let foreign = cipher::encrypt(b"forged", stranger.as_age()).unwrap();
    let conn = rusqlite::Connection::open(t.database()).unwrap();
    conn.execute(
        "UPDATE secrets SET ciphertext = ?1 WHERE key = 'BAD'",
        [&foreign],
    )
    .unwrap();
    drop(conn);

    let output = t.grep("BAD");
    assert_code(&output, 4);
    assert_stderr_contains(&output, "authentication failed");

    // Listing degrades per key.
    let output = t.cat();
    assert_success(&output);
    assert_eq!(stdout(&output), "GOOD=ok\n");
    assert_stderr_contains(&output, "could not decrypt BAD");

    let json = t.cat_json();
    assert_eq!(json["failed"][0]["key"], "BAD");

    // Dump leaves the failed key out of the file.
    let output = t.kryptos(&["dump"]);
    assert_success(&output);
    let content = std::fs::read_to_string(t.path(".env")).unwrap();
    assert_eq!(content, "GOOD=ok\n");
}

#[test]
fn test_config_file_parse_error() {
    let t = Test::new();
    std::fs::write(t.home.path().join("config.toml"), "database = [").unwrap();

    let output = t.cat();
    assert_code(&output, 1);
    assert_stderr_contains(&output, "config");
}

#[test]
fn test_completions() {
    let t = Test::new();

    for shell in ["bash", "zsh", "fish", "power-shell"] {
        let output = t.kryptos(&["completions", shell]);
        assert_success(&output);
        assert_stdout_contains(&output, "kryptos");
    }
}
