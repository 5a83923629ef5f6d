//! Environment variable access behind a trait so resolution and process
//! setup can run against a fixed variable map.

use std::collections::HashMap;
use std::ffi::OsString;

pub trait EnvProvider: Send + Sync {
    fn get(&self, key: &str) -> Option<OsString>;

    /// Value as UTF-8, treating unset, empty and non-UTF-8 values alike.
    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(|v| v.into_string().ok())
            .filter(|v| !v.is_empty())
    }
}

/// Reads from the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnv;

impl EnvProvider for SystemEnv {
    fn get(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }
}

/// Fixed set of variables, used wherever the process environment must not leak in.
#[derive(Debug, Default, Clone)]
pub struct StaticEnv {
    vars: HashMap<String, OsString>,
}

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl EnvProvider for StaticEnv {
    fn get(&self, key: &str) -> Option<OsString> {
        self.vars.get(key).cloned()
    }
}
