//! In-memory backends, used by tests and by hosts without a browser.

use std::sync::Arc;

use dashmap::DashMap;

use super::cookie::{decode_value, encode_value, Cookie};
use super::traits::{CookieStore, LocalStore, StorageError};
use crate::clock::{Clock, SystemClock};

/// Values are held URL-encoded, the way a browser jar holds them.
pub struct MemoryCookieStore {
    jar: DashMap<String, Cookie>,
    enabled: bool,
    clock: Arc<dyn Clock>,
}

impl MemoryCookieStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Expirations are judged against `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            jar: DashMap::new(),
            enabled: true,
            clock,
        }
    }

    /// A jar reporting cookies as disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Last write for `name`, including attributes
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        self.jar.get(name).map(|entry| Cookie {
            value: decode_value(&entry.value().value),
            ..entry.value().clone()
        })
    }

    /// `name=value` pairs as a page script would see them.
    #[must_use]
    pub fn document_cookie(&self) -> String {
        let mut pairs: Vec<String> = self
            .jar
            .iter()
            .map(|entry| format!("{}={}", entry.key(), entry.value().value))
            .collect();
        pairs.sort();
        pairs.join("; ")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.jar.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jar.is_empty()
    }

    pub fn clear(&self) {
        self.jar.clear();
    }
}

impl Default for MemoryCookieStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieStore for MemoryCookieStore {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        let now = self.clock.now();
        Ok(self
            .jar
            .get(name)
            .filter(|cookie| !cookie.is_expired_at(now))
            .map(|cookie| decode_value(&cookie.value)))
    }

    fn set(&self, cookie: &Cookie) -> Result<(), StorageError> {
        if cookie.is_expired_at(self.clock.now()) {
            self.jar.remove(&cookie.name);
        } else {
            let stored = Cookie {
                value: encode_value(&cookie.value),
                ..cookie.clone()
            };
            self.jar.insert(cookie.name.clone(), stored);
        }
        Ok(())
    }
}

pub struct MemoryLocalStore {
    data: DashMap<String, String>,
    /// Total bytes (keys + values) allowed
    quota_bytes: Option<usize>,
    available: bool,
}

impl MemoryLocalStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            quota_bytes: None,
            available: true,
        }
    }

    /// A store that rejects writes once `quota_bytes` would be exceeded.
    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new()
        }
    }

    /// A store where every call fails, as with disabled storage.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&self) {
        self.data.clear();
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.data
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }
}

impl Default for MemoryLocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        Ok(self.data.get(key).map(|value| value.clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        if let Some(quota) = self.quota_bytes {
            if self.used_bytes_without(key) + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded { key: key.to_string() });
            }
        }
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        self.data.remove(key);
        Ok(())
    }
}
