//! Tests for `kryptos rotate`.

use crate::support::*;
use kryptos::core::keys::StoreKey;
use std::fs;

fn key_id(t: &Test) -> String {
    t.info_json()["key_id"].as_str().unwrap().to_string()
}

#[test]
fn test_rotate_reencrypts_and_archives() {
    let t = Test::with_secrets(&[("A", "1"), ("A", "2"), ("B", "b")]);
    assert_success(&t.set_global("G", "g"));
    let before = key_id(&t);
    let old_key = fs::read_to_string(t.key_file()).unwrap();

    let output = t.kryptos(&["rotate"]);
    assert_success(&output);
    assert_stdout_contains(&output, "re-encrypted 4 record(s)");

    assert_ne!(key_id(&t), before);
    assert_ne!(fs::read_to_string(t.key_file()).unwrap(), old_key);
    assert!(!t.home.path().join("identity.key.next").exists());

    let archived: Vec<_> = fs::read_dir(t.home.path().join("archive"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(archived.len(), 1);
    assert_eq!(fs::read_to_string(&archived[0]).unwrap(), old_key);

    assert_eq!(stdout(&t.grep("A")), "2\n");
    assert_eq!(stdout(&t.grep("G")), "g\n");
    // The deprecated version was re-encrypted too.
    assert_success(&t.rm("A", &["--all"]));
    assert_eq!(stdout(&t.grep("A")), "1\n");
}

#[test]
fn test_old_key_no_longer_decrypts() {
    let t = Test::with_secrets(&[("A", "1")]);
    let old_key = fs::read_to_string(t.key_file()).unwrap();
    let material = old_key
        .lines()
        .find(|l| l.starts_with("AGE-SECRET-KEY-"))
        .unwrap()
        .to_string();

    assert_success(&t.kryptos(&["rotate"]));

    let output = t
        .cmd()
        .env("KRYPTOS_ENCRYPTION_KEY", &material)
        .args(["grep", "A"])
        .output()
        .unwrap();
    assert_code(&output, 4);
}

#[test]
fn test_rotate_to_supplied_key() {
    let t = Test::with_secrets(&[("A", "1")]);
    let new = StoreKey::generate();

    let output = t
        .cmd()
        .args(["rotate", "--encryption-key", new.expose().as_str()])
        .output()
        .unwrap();
    assert_success(&output);

    assert_eq!(key_id(&t), new.id());
    assert_eq!(stdout(&t.grep("A")), "1\n");
}

#[test]
fn test_rotate_rejects_invalid_key() {
    let t = Test::with_secrets(&[("A", "1")]);
    let before = key_id(&t);

    let output = t.kryptos(&["rotate", "-e", "not-a-key"]);
    assert_code(&output, 4);
    assert_eq!(key_id(&t), before);
}

#[test]
fn test_rotate_with_env_key_prints_new_key() {
    let t = Test::new();
    let env_key = StoreKey::generate();
    let material = env_key.expose();

    let output = t
        .cmd()
        .env("KRYPTOS_ENCRYPTION_KEY", material.as_str())
        .args(["set", "A", "1"])
        .output()
        .unwrap();
    assert_success(&output);
    assert!(!t.key_file().exists());

    let output = t
        .cmd()
        .env("KRYPTOS_ENCRYPTION_KEY", material.as_str())
        .arg("rotate")
        .output()
        .unwrap();
    assert_success(&output);
    assert_stderr_contains(&output, "KRYPTOS_ENCRYPTION_KEY");

    let new_material = stdout(&output)
        .lines()
        .find(|l| l.starts_with("AGE-SECRET-KEY-"))
        .unwrap()
        .to_string();

    let output = t
        .cmd()
        .env("KRYPTOS_ENCRYPTION_KEY", &new_material)
        .args(["grep", "A"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output), "1\n");
}

#[test]
fn test_rotate_empty_store_without_key() {
    let t = Test::new();
    assert_code(&t.kryptos(&["rotate"]), 4);
}
