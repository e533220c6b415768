//! Session settings shared between installer components.
//!
//! The download coordinator only writes to this store; other installer
//! steps read it back (for example to skip a package-manager retry after a
//! failed download).

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

/// Settings key raised when the package download step fails.
pub const FAILED_DOWNLOAD: &str = "failed_download";

/// Shared, mutable settings store.
pub trait SessionSettings: Send + Sync {
    /// Set a setting, replacing any previous value.
    fn set(&self, key: &str, value: Value);

    /// Read a setting.
    fn get(&self, key: &str) -> Option<Value>;

    /// Read a boolean setting, `false` when unset or not a boolean.
    fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }
}

/// Thread-safe in-memory [`SessionSettings`].
#[derive(Debug, Default)]
pub struct SharedSettings {
    values: RwLock<HashMap<String, Value>>,
}

impl SharedSettings {
    /// Create an empty settings store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every setting.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.values.read().clone()
    }
}

impl SessionSettings for SharedSettings {
    fn set(&self, key: &str, value: Value) {
        self.values.write().insert(key.to_string(), value);
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }
}
