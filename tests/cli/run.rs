//! Tests for `kryptos run`.

use crate::support::*;

#[cfg(unix)]
#[test]
fn test_run_injects_env_vars() {
    let t = Test::with_secrets(&[("INJECTED_VAR", "injected value")]);

    let output = t.run(&["sh", "-c", "echo \"$INJECTED_VAR\""]);
    assert_success(&output);
    assert_eq!(stdout(&output), "injected value\n");
}

#[cfg(unix)]
#[test]
fn test_run_uses_effective_values() {
    let t = Test::new();
    assert_success(&t.set_global("URL", "global"));
    assert_success(&t.set_global("SHARED", "s"));
    assert_success(&t.set("URL", "project"));

    let output = t.run(&["sh", "-c", "echo \"$URL $SHARED\""]);
    assert_success(&output);
    assert_eq!(stdout(&output), "project s\n");
}

#[cfg(unix)]
#[test]
fn test_run_with_no_secrets() {
    let t = Test::new();

    let output = t.run(&["echo", "hello"]);
    assert_success(&output);
    assert_stdout_contains(&output, "hello");
}

#[cfg(unix)]
#[test]
fn test_run_command_exit_code_passthrough() {
    let t = Test::with_secrets(&[("A", "1")]);

    let output = t.run(&["sh", "-c", "exit 42"]);
    assert_code(&output, 42);
}

#[cfg(unix)]
#[test]
fn test_run_passes_child_flags() {
    let t = Test::new();

    let output = t.run(&["sh", "-c", "echo $0 $1", "-x", "--flag"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "-x --flag\n");
}

#[test]
fn test_run_without_command_fails() {
    let t = Test::new();
    assert_failure(&t.kryptos(&["run"]));
}

#[test]
fn test_run_missing_program() {
    let t = Test::new();
    let output = t.run(&["kryptos-test-no-such-program"]);
    assert_code(&output, 1);
    assert_stderr_contains(&output, "failed to run");
}

#[cfg(unix)]
#[test]
fn test_run_closes_store_before_exit() {
    let t = Test::with_secrets(&[("A", "1")]);
    let wal = t.database().with_file_name("kryptos.db-wal");
    assert!(!wal.exists());

    let output = t.run(&["sh", "-c", "exit 3"]);
    assert_code(&output, 3);

    // SQLite removes the WAL file when the last connection closes.
    assert!(!wal.exists());
}
