//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a kryptos command with an isolated environment.
    ///
    /// Returns a Command configured with:
    /// - KRYPTOS_HOME (and HOME) set to the temporary home directory
    /// - every other KRYPTOS_* variable cleared
    /// - current directory set to the test working directory
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("kryptos").expect("failed to find kryptos binary");
        for var in [
            "KRYPTOS_DATABASE",
            "KRYPTOS_KEY_FILE",
            "KRYPTOS_ENCRYPTION_KEY",
            "KRYPTOS_NEW_ENCRYPTION_KEY",
            "KRYPTOS_PROJECT",
            "KRYPTOS_LOG",
        ] {
            cmd.env_remove(var);
        }
        cmd.env("KRYPTOS_HOME", self.home.path());
        cmd.env("HOME", self.home.path());
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run kryptos with `args`.
    pub fn kryptos(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run kryptos")
    }

    /// Shortcut for `kryptos set` in the current project.
    pub fn set(&self, key: &str, val: &str) -> Output {
        self.kryptos(&["set", key, val])
    }

    /// Shortcut for `kryptos set --global`.
    pub fn set_global(&self, key: &str, val: &str) -> Output {
        self.kryptos(&["set", "--global", key, val])
    }

    /// Shortcut for `kryptos grep`.
    pub fn grep(&self, key: &str) -> Output {
        self.kryptos(&["grep", key])
    }

    /// Shortcut for `kryptos rm` with extra flags.
    pub fn rm(&self, key: &str, flags: &[&str]) -> Output {
        let mut args = vec!["rm", key];
        args.extend_from_slice(flags);
        self.kryptos(&args)
    }

    /// Shortcut for `kryptos cat`.
    pub fn cat(&self) -> Output {
        self.kryptos(&["cat"])
    }

    /// Shortcut for `kryptos cat --json`, parsed.
    pub fn cat_json(&self) -> serde_json::Value {
        let output = self.kryptos(&["cat", "--json"]);
        super::assert_success(&output);
        serde_json::from_slice(&output.stdout).expect("cat --json is not JSON")
    }

    /// Shortcut for `kryptos history --json`, parsed.
    pub fn history_json(&self, key: &str, global: bool) -> serde_json::Value {
        let mut args = vec!["history", key, "--json"];
        if global {
            args.push("--global");
        }
        let output = self.kryptos(&args);
        super::assert_success(&output);
        serde_json::from_slice(&output.stdout).expect("history --json is not JSON")
    }

    /// Shortcut for `kryptos info --json`, parsed.
    pub fn info_json(&self) -> serde_json::Value {
        let output = self.kryptos(&["info", "--json"]);
        super::assert_success(&output);
        serde_json::from_slice(&output.stdout).expect("info --json is not JSON")
    }

    /// Shortcut for `kryptos run` command.
    pub fn run(&self, command: &[&str]) -> Output {
        let mut cmd = self.cmd();
        cmd.arg("run").arg("--");
        for arg in command {
            cmd.arg(arg);
        }
        cmd.output().expect("failed to run kryptos run")
    }
}
