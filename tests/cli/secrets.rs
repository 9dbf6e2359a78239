//! Tests for `kryptos set/grep/rm/cat/dump/history`.

use crate::support::*;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_set_and_grep_roundtrip() {
    let t = Test::new();

    let output = t.set("DATABASE_URL", "postgres://localhost/db");
    assert_success(&output);
    assert_stdout_contains(&output, "DATABASE_URL");
    assert_stdout_contains(&output, "v1");

    assert_roundtrip(&t, "API_KEY", "sk-test-12345");
}

#[test]
fn test_first_set_generates_key_file() {
    let t = Test::new();
    assert!(!t.key_file().exists());

    let output = t.set("KEY", "value");
    assert_success(&output);
    assert_stdout_contains(&output, "generated store key");
    assert!(t.key_file().exists());
    assert!(t.database().exists());

    // The second write reuses the key.
    let output = t.set("KEY", "value2");
    assert_success(&output);
    assert_stdout_excludes(&output, "generated store key");
}

#[cfg(unix)]
#[test]
fn test_key_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let t = Test::with_secrets(&[("KEY", "value")]);
    let mode = fs::metadata(t.key_file()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_set_bumps_version() {
    let t = Test::with_secrets(&[("KEY", "one"), ("KEY", "two")]);

    t.cmd()
        .args(["set", "KEY", "three"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v3"));

    let output = t.grep("KEY");
    assert_eq!(stdout(&output), "three\n");
}

#[test]
fn test_grep_output_is_plain() {
    let t = Test::with_secrets(&[("MULTI", "a value with spaces")]);

    let output = t.grep("MULTI");
    assert_success(&output);
    assert_eq!(stdout(&output), "a value with spaces\n");
    assert!(stderr(&output).is_empty());
}

#[test]
fn test_empty_value_is_stored() {
    let t = Test::new();

    let output = t.set("EMPTY", "");
    assert_success(&output);
    assert_stdout_contains(&output, "v1");

    let output = t.grep("EMPTY");
    assert_success(&output);
    assert_eq!(stdout(&output), "\n");

    t.cmd().args(["dump", "-o", "out.env"]).assert().success();
    let content = fs::read_to_string(t.path("out.env")).unwrap();
    assert_eq!(content, "EMPTY=\"\"\n");
}

#[test]
fn test_invalid_key_names_rejected() {
    let t = Test::new();

    for key in ["123BAD", "HAS-DASH", "HAS SPACE", "DOT.KEY"] {
        let output = t.set(key, "value");
        assert_code(&output, 2);
    }
    // Nothing was written, so no key was generated.
    assert!(!t.key_file().exists());
}

#[test]
fn test_rm_keeps_current_by_default() {
    let t = Test::with_secrets(&[("KEY", "x"), ("KEY", "y"), ("KEY", "z")]);

    let output = t.rm("KEY", &[]);
    assert_success(&output);
    assert_stdout_contains(&output, "removed 2 version(s)");

    assert_eq!(stdout(&t.grep("KEY")), "z\n");
    let history = t.history_json("KEY", false);
    assert_eq!(history["versions"].as_array().unwrap().len(), 1);
}

#[test]
fn test_rm_all_promotes_previous() {
    let t = Test::with_secrets(&[("KEY", "x"), ("KEY", "y"), ("KEY", "z")]);

    let output = t.rm("KEY", &["--all"]);
    assert_success(&output);
    assert_stdout_contains(&output, "v2 is now current");

    assert_eq!(stdout(&t.grep("KEY")), "y\n");
}

#[test]
fn test_rm_all_last_version() {
    let t = Test::with_secrets(&[("KEY", "only")]);

    assert_success(&t.rm("KEY", &["-a"]));
    assert_code(&t.grep("KEY"), 3);
    assert_code(&t.rm("KEY", &[]), 3);
}

#[test]
fn test_rm_missing_key_not_found() {
    let t = Test::with_secrets(&[("KEY", "v")]);

    let output = t.rm("MISSING", &[]);
    assert_code(&output, 3);
    assert_stderr_contains(&output, "secret not found");
}

#[test]
fn test_cat_lists_sorted_pairs() {
    let t = Test::with_secrets(&[("ZED", "last"), ("ALPHA", "first")]);

    let output = t.cat();
    assert_success(&output);
    assert_eq!(stdout(&output), "ALPHA=first\nZED=last\n");
}

#[test]
fn test_cat_empty_store() {
    let t = Test::new();

    let output = t.cat();
    assert_success(&output);
    assert_stdout_contains(&output, "no secrets stored");
    // Listing never generates a key.
    assert!(!t.key_file().exists());
}

#[test]
fn test_cat_json() {
    let t = Test::with_secrets(&[("A", "1"), ("B", "2")]);

    let json = t.cat_json();
    assert_eq!(json["secrets"]["A"], "1");
    assert_eq!(json["secrets"]["B"], "2");
    assert_eq!(json["failed"].as_array().unwrap().len(), 0);
}

#[test]
fn test_dump_writes_env_file() {
    let t = Test::with_secrets(&[("C", "3"), ("SPACED", "hello world")]);
    assert_success(&t.set_global("A", "1"));

    let output = t.kryptos(&["dump"]);
    assert_success(&output);
    assert_stdout_contains(&output, "wrote 3 secret(s)");

    let content = fs::read_to_string(t.path(".env")).unwrap();
    assert_eq!(content, "A=1\nC=3\nSPACED=\"hello world\"\n");
}

#[test]
fn test_dump_custom_target_replaces_file() {
    let t = Test::with_secrets(&[("A", "1")]);
    let target = t.path("prod.env");
    fs::write(&target, "STALE=1\n").unwrap();

    let output = t.kryptos(&["dump", "--output", "prod.env"]);
    assert_success(&output);
    assert_eq!(fs::read_to_string(&target).unwrap(), "A=1\n");
}

#[test]
fn test_dump_into_missing_directory_fails() {
    let t = Test::with_secrets(&[("A", "1")]);

    let output = t.kryptos(&["dump", "-o", "missing/dir/.env"]);
    assert_code(&output, 1);
    assert!(!t.path("missing/dir/.env").exists());
}

#[test]
fn test_history_lists_versions_newest_first() {
    let t = Test::with_secrets(&[("KEY", "a"), ("KEY", "b"), ("KEY", "c")]);

    let history = t.history_json("KEY", false);
    let versions = history["versions"].as_array().unwrap();
    let summary: Vec<(i64, &str)> = versions
        .iter()
        .map(|v| (v["version"].as_i64().unwrap(), v["status"].as_str().unwrap()))
        .collect();
    assert_eq!(
        summary,
        vec![(3, "active"), (2, "deprecated"), (1, "deprecated")]
    );

    // Values never appear in history.
    let output = t.kryptos(&["history", "KEY"]);
    assert_success(&output);
    assert_stdout_contains(&output, "deprecated");
    assert_stdout_excludes(&output, "=a");
}

#[test]
fn test_history_missing_key() {
    let t = Test::new();
    assert_code(&t.kryptos(&["history", "NOPE"]), 3);
}

#[test]
fn test_versions_not_reused_after_full_delete() {
    let t = Test::with_secrets(&[("KEY", "a"), ("KEY", "b")]);
    assert_success(&t.rm("KEY", &["--all"]));
    assert_success(&t.rm("KEY", &["--all"]));

    let output = t.set("KEY", "c");
    assert_success(&output);
    assert_stdout_contains(&output, "v3");
}
