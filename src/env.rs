//! Read-only access to the environment variables the pipeline consults.

use std::collections::HashMap;
use std::ffi::OsString;

/// Source of environment variables.
pub trait EnvSource {
    fn var_os(&self, key: &str) -> Option<OsString>;

    /// Value of `key` when it is set to something non-empty.
    fn non_empty(&self, key: &str) -> Option<OsString> {
        self.var_os(key).filter(|value| !value.is_empty())
    }

    fn is_set(&self, key: &str) -> bool {
        self.var_os(key).is_some()
    }
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var_os(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }
}

/// Fixed set of variables, used where the process environment must not leak in.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, OsString>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<OsString>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn var_os(&self, key: &str) -> Option<OsString> {
        self.vars.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_env_lookup() {
        let env = MapEnv::new().with("Qt6_DIR", "/opt/qt").with("EMPTY", "");

        assert_eq!(env.var_os("Qt6_DIR"), Some(OsString::from("/opt/qt")));
        assert!(env.is_set("EMPTY"));
        assert!(env.non_empty("EMPTY").is_none());
        assert!(!env.is_set("PATH"));
    }
}
