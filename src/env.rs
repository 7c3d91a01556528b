//! Environment snapshots handed to child processes.
//!
//! The caller's environment is process-wide and can change underneath us, so
//! it is captured once per call and passed to the spawn step as a value.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// An owned set of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<OsString, OsString>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars_os().collect(),
        }
    }

    /// A snapshot with no variables.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Return this snapshot with `key` set to `value`.
    pub fn with(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.set(key, value);
        self
    }

    /// Set `key` to `value`, replacing any existing value.
    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Copy every variable of `other` into this snapshot.
    pub fn extend(&mut self, other: &EnvSnapshot) {
        for (k, v) in other.iter() {
            self.vars.insert(k.to_os_string(), v.to_os_string());
        }
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterate variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }
}

impl<K: Into<OsString>, V: Into<OsString>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
