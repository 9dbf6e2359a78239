//! Tests for `kryptos info`.

use crate::support::*;

#[test]
fn test_info_on_fresh_store() {
    let t = Test::new();

    let info = t.info_json();
    assert_eq!(info["records"], 0);
    assert_eq!(info["keys"], 0);
    assert!(info["key_id"].is_null());
    assert!(info["rotated_at"].is_null());
    assert_eq!(info["schema_version"], 1);
    assert_eq!(info["tool_version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(info["project"].as_str().unwrap().len(), 16);
}

#[test]
fn test_info_counts_scopes() {
    let t = Test::with_secrets(&[("A", "1"), ("A", "2")]);
    assert_success(&t.set_global("A", "g"));
    assert_success(&t.set_global("B", "g"));

    let info = t.info_json();
    assert_eq!(info["records"], 4);
    assert_eq!(info["keys"], 2);
    assert_eq!(info["global_records"], 2);
    assert_eq!(info["project_records"], 2);
    assert!(info["key_id"].as_str().unwrap().starts_with("age1"));
    assert!(info["path"].as_str().unwrap().ends_with("kryptos.db"));
}

#[test]
fn test_info_reports_rotation() {
    let t = Test::with_secrets(&[("A", "1")]);
    assert_success(&t.kryptos(&["rotate"]));

    assert!(t.info_json()["rotated_at"].is_string());
}

#[test]
fn test_info_human_output() {
    let t = Test::with_secrets(&[("A", "1")]);

    let output = t.kryptos(&["info"]);
    assert_success(&output);
    assert_stdout_contains(&output, "records:");
    assert_stdout_contains(&output, "key id:");
    assert_stdout_contains(&output, "age1");
}

#[test]
fn test_info_survives_malformed_key() {
    let t = Test::with_secrets(&[("A", "1")]);
    let key_id = t.info_json()["key_id"].as_str().unwrap().to_string();

    let output = t
        .cmd()
        .args(["info", "--json"])
        .env("KRYPTOS_ENCRYPTION_KEY", "garbage")
        .output()
        .unwrap();
    assert_success(&output);

    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["records"], 1);
    assert_eq!(info["key_id"], key_id.as_str());
    assert_stderr_contains(&output, "store key unavailable");

    // Commands that need the key still fail.
    let output = t
        .cmd()
        .args(["grep", "A"])
        .env("KRYPTOS_ENCRYPTION_KEY", "garbage")
        .output()
        .unwrap();
    assert_code(&output, 4);
}
