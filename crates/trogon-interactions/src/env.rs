//! Environment access behind a trait so configuration can be tested without
//! touching the process environment.

use std::collections::HashMap;
use std::env::{self, VarError};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub trait ReadEnv {
    fn var(&self, key: &str) -> Result<String, VarError>;

    /// Parse `key`, falling back to `default` when unset or unparseable.
    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> T {
        self.var(key)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// `key` as a non-blank string.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Zero-sized type; delegates to `std::env`.
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    #[inline]
    fn var(&self, key: &str) -> Result<String, VarError> {
        env::var(key)
    }
}

/// In-process environment for tests.
///
/// `Clone + Send + Sync`, so a config can be built inside spawned tasks.
#[derive(Clone, Default)]
pub struct MemoryEnv {
    vars: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.vars
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.vars
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }
}

impl ReadEnv for MemoryEnv {
    fn var(&self, key: &str) -> Result<String, VarError> {
        self.vars
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
            .ok_or(VarError::NotPresent)
    }
}
