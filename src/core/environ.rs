//! Environment injection.
//!
//! Copying resolved values into an environment is an explicit step over an
//! already resolved mapping. The core never touches the process environment
//! on its own; callers choose the sink.

use std::collections::BTreeMap;
use std::process::Command;

use tracing::debug;

/// Something that accepts environment variables.
pub trait EnvSink {
    /// Set one variable.
    fn set(&mut self, key: &str, value: &str);
}

impl EnvSink for Command {
    fn set(&mut self, key: &str, value: &str) {
        self.env(key, value);
    }
}

impl EnvSink for BTreeMap<String, String> {
    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

/// The environment of the current process.
///
/// Only use this before any other threads are started.
pub struct ProcessEnv;

impl EnvSink for ProcessEnv {
    fn set(&mut self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }
}

/// Write every pair into `sink`. Returns the number of variables set.
pub fn inject<'a, S, I>(sink: &mut S, pairs: I) -> usize
where
    S: EnvSink + ?Sized,
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut count = 0;
    for (key, value) in pairs {
        sink.set(key, value);
        count += 1;
    }
    debug!(count, "injected environment");
    count
}
