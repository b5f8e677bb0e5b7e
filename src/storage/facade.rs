// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Dual-backend persistence.
//!
//! Every identity and state key lives in two places: a cookie (readable by
//! the server and by older integrations) and a structured local-store entry
//! holding `{ value, timestamp }`. Writes go to both; reads prefer a
//! non-empty cookie and fall back to the structured entry.
//!
//! ```text
//!   read(key) ──► cookie (non-empty)? ──yes──► value
//!                        │ no
//!                        ▼
//!                 local entry parses? ──yes──► value
//!                        │ no
//!                        ▼
//!                 purge key, None
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use super::cookie::CookiePolicy;
use super::traits::{CookieStore, LocalStore, StorageError};
use crate::clock::{to_timestamp, Clock};

const STORAGE_PROBE_KEY: &str = "ss-test";

/// The unit persisted to the structured store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredValue<T> {
    pub value: T,
    #[serde(default)]
    pub timestamp: String,
    /// Page the value was minted on (page-load ids only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Which backends the host actually offers. Detected once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub cookies: bool,
    pub storage: bool,
}

impl Capabilities {
    pub fn detect(cookies: Option<&dyn CookieStore>, local: Option<&dyn LocalStore>) -> Self {
        let cookies = cookies.is_some_and(|jar| jar.enabled());
        let storage = local.is_some_and(|store| {
            store.set_item(STORAGE_PROBE_KEY, STORAGE_PROBE_KEY).is_ok()
                && store.remove_item(STORAGE_PROBE_KEY).is_ok()
        });
        Self { cookies, storage }
    }

    #[must_use]
    pub fn any(&self) -> bool {
        self.cookies || self.storage
    }
}

/// A structured write the host refused for lack of space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageFault {
    pub key: String,
    pub value: String,
}

pub struct PersistentStore {
    cookies: Option<Arc<dyn CookieStore>>,
    local: Option<Arc<dyn LocalStore>>,
    capabilities: Capabilities,
    policy: CookiePolicy,
    clock: Arc<dyn Clock>,
    faults: Option<UnboundedSender<StorageFault>>,
}

impl PersistentStore {
    pub fn new(
        cookies: Option<Arc<dyn CookieStore>>,
        local: Option<Arc<dyn LocalStore>>,
        policy: CookiePolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let capabilities = Capabilities::detect(cookies.as_deref(), local.as_deref());
        if !capabilities.any() {
            warn!("No cookie or local storage available, identity and state will not persist");
        }
        Self {
            cookies,
            local,
            capabilities,
            policy,
            clock,
            faults: None,
        }
    }

    /// Route quota failures to `sink` instead of dropping them.
    #[must_use]
    pub fn with_fault_sink(mut self, sink: UnboundedSender<StorageFault>) -> Self {
        self.faults = Some(sink);
        self
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ───────────────────────────── cookies ─────────────────────────────

    /// Non-empty cookie value.
    #[must_use]
    pub fn cookie(&self, key: &str) -> Option<String> {
        if !self.capabilities.cookies {
            return None;
        }
        let jar = self.cookies.as_ref()?;
        match jar.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key, error = %e, "Failed to read cookie");
                None
            }
        }
    }

    /// `ttl` of `None` writes a session cookie.
    pub fn set_cookie(&self, key: &str, value: &str, ttl: Option<Duration>) {
        if !self.capabilities.cookies {
            return;
        }
        let Some(jar) = self.cookies.as_ref() else { return };
        let cookie = self.policy.cookie(key, value, ttl, self.now());
        if let Err(e) = jar.set(&cookie) {
            warn!(key, error = %e, "Failed to set cookie");
        }
    }

    pub fn expire_cookie(&self, key: &str) {
        if !self.capabilities.cookies {
            return;
        }
        let Some(jar) = self.cookies.as_ref() else { return };
        if let Err(e) = jar.set(&self.policy.expired(key)) {
            warn!(key, error = %e, "Failed to expire cookie");
        }
    }

    // ───────────────────────────── structured ─────────────────────────────

    fn local_raw(&self, key: &str) -> Option<String> {
        if !self.capabilities.storage {
            return None;
        }
        let store = self.local.as_ref()?;
        match store.get_item(key) {
            Ok(raw) => raw.filter(|r| !r.is_empty()),
            Err(e) => {
                warn!(key, error = %e, "Failed to read local storage");
                None
            }
        }
    }

    /// Structured entry for `key`. An object is read as the envelope; a bare
    /// array is taken as an unstamped value. Anything else, or a shape that
    /// does not fit `T`, is purged and reported absent.
    #[must_use]
    pub fn read_stored<T: DeserializeOwned>(&self, key: &str) -> Option<StoredValue<T>> {
        let raw = self.local_raw(key)?;
        let parsed = match serde_json::from_str::<Value>(&raw) {
            Ok(envelope @ Value::Object(_)) => serde_json::from_value::<StoredValue<T>>(envelope).ok(),
            Ok(bare @ Value::Array(_)) => serde_json::from_value::<T>(bare).ok().map(|value| StoredValue {
                value,
                timestamp: String::new(),
                href: None,
            }),
            _ => None,
        };
        if parsed.is_none() {
            debug!(key, "Purging unreadable local storage entry");
            crate::metrics::record_corrupt_entry(key);
            self.remove_stored(key);
        }
        parsed
    }

    /// Persist `value` with a fresh timestamp.
    pub fn write_stored<T: Serialize>(&self, key: &str, value: &T, href: Option<&str>) {
        if !self.capabilities.storage {
            return;
        }
        let Some(store) = self.local.as_ref() else { return };

        let stored = StoredValue {
            value,
            timestamp: to_timestamp(self.now()),
            href: href.map(str::to_string),
        };
        let serialized = match serde_json::to_string(&stored) {
            Ok(s) => s,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize local storage entry");
                return;
            }
        };

        match store.set_item(key, &serialized) {
            Ok(()) => {}
            Err(StorageError::QuotaExceeded { .. }) => {
                let value = serde_json::to_string(&stored.value).unwrap_or_default();
                warn!(key, bytes = serialized.len(), "Local storage quota exceeded");
                crate::metrics::record_storage_fault(key);
                self.report_fault(StorageFault {
                    key: key.to_string(),
                    value,
                });
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to write local storage");
            }
        }
    }

    pub fn remove_stored(&self, key: &str) {
        let Some(store) = self.local.as_ref() else { return };
        if let Err(e) = store.remove_item(key) {
            debug!(key, error = %e, "Failed to remove local storage entry");
        }
    }

    fn report_fault(&self, fault: StorageFault) {
        if let Some(sink) = &self.faults {
            if sink.send(fault).is_err() {
                debug!("Storage fault sink closed");
            }
        }
    }

    // ───────────────────────────── combined ─────────────────────────────

    /// Cookie if present and non-empty, else the structured value as text.
    #[must_use]
    pub fn read(&self, key: &str) -> Option<String> {
        self.cookie(key).or_else(|| {
            self.read_stored::<Value>(key).and_then(|stored| match stored.value {
                Value::String(s) if !s.is_empty() => Some(s),
                Value::String(_) | Value::Null => None,
                other => Some(other.to_string()),
            })
        })
    }

    /// Write `cookie_value` to the cookie and `value` to the structured store.
    pub fn write<T: Serialize>(&self, key: &str, value: &T, cookie_value: &str, ttl: Option<Duration>) {
        self.set_cookie(key, cookie_value, ttl);
        self.write_stored(key, value, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::storage::memory::{MemoryCookieStore, MemoryLocalStore};

    fn store_with(
        cookies: Arc<MemoryCookieStore>,
        local: Arc<MemoryLocalStore>,
    ) -> PersistentStore {
        PersistentStore::new(
            Some(cookies),
            Some(local),
            CookiePolicy::for_page("https://www.example.com/"),
            Arc::new(SystemClock),
        )
    }

    #[test]
    fn test_capabilities_detected() {
        let store = store_with(Arc::new(MemoryCookieStore::new()), Arc::new(MemoryLocalStore::new()));
        assert_eq!(store.capabilities(), Capabilities { cookies: true, storage: true });

        let store = PersistentStore::new(
            Some(Arc::new(MemoryCookieStore::disabled())),
            Some(Arc::new(MemoryLocalStore::unavailable())),
            CookiePolicy::for_page(""),
            Arc::new(SystemClock),
        );
        assert!(!store.capabilities().any());
        // Ephemeral: writes vanish, reads are empty, nothing panics
        store.write("ssUserId", &"abc", "abc", None);
        assert!(store.read("ssUserId").is_none());
    }

    #[test]
    fn test_probe_key_is_cleaned_up() {
        let local = Arc::new(MemoryLocalStore::new());
        let _store = store_with(Arc::new(MemoryCookieStore::new()), local.clone());
        assert!(local.is_empty());
    }

    #[test]
    fn test_cookie_wins_over_structured() {
        let cookies = Arc::new(MemoryCookieStore::new());
        let local = Arc::new(MemoryLocalStore::new());
        let store = store_with(cookies, local);

        store.write_stored("ssShopperId", &"from-local", None);
        assert_eq!(store.read("ssShopperId").as_deref(), Some("from-local"));

        store.set_cookie("ssShopperId", "from-cookie", None);
        assert_eq!(store.read("ssShopperId").as_deref(), Some("from-cookie"));

        // Empty cookie falls through
        store.set_cookie("ssShopperId", "", None);
        assert_eq!(store.read("ssShopperId").as_deref(), Some("from-local"));
    }

    #[test]
    fn test_corrupt_entries_are_purged() {
        let local = Arc::new(MemoryLocalStore::new());
        let store = store_with(Arc::new(MemoryCookieStore::new()), local.clone());

        for garbage in ["{not json", "42", "\"just a string\"", "[1,2,3]", "{\"nope\": 1}"] {
            local.set_item("ssCart", garbage).unwrap();
            assert!(store.read_stored::<Vec<String>>("ssCart").is_none(), "{garbage}");
            assert!(local.get_item("ssCart").unwrap().is_none(), "{garbage} not purged");
        }
    }

    #[test]
    fn test_bare_array_is_read_unstamped() {
        let local = Arc::new(MemoryLocalStore::new());
        let store = store_with(Arc::new(MemoryCookieStore::new()), local.clone());
        local.set_item("ssViewed", r#"["a","b"]"#).unwrap();

        let stored = store.read_stored::<Vec<String>>("ssViewed").unwrap();
        assert_eq!(stored.value, vec!["a", "b"]);
        assert!(stored.timestamp.is_empty());
        assert!(local.get_item("ssViewed").unwrap().is_some());

        // An array that cannot be a String is still corrupt for an id key
        local.set_item("ssUserId", r#"["a"]"#).unwrap();
        assert!(store.read_stored::<String>("ssUserId").is_none());
        assert!(local.get_item("ssUserId").unwrap().is_none());
    }

    #[test]
    fn test_stored_value_shape() {
        let local = Arc::new(MemoryLocalStore::new());
        let store = store_with(Arc::new(MemoryCookieStore::new()), local.clone());

        store.write_stored("ssViewed", &vec!["a", "b"], None);
        let raw: Value = serde_json::from_str(&local.get_item("ssViewed").unwrap().unwrap()).unwrap();
        assert_eq!(raw["value"], serde_json::json!(["a", "b"]));
        assert!(raw["timestamp"].as_str().unwrap().ends_with('Z'));
        assert!(raw.get("href").is_none());
    }

    #[test]
    fn test_quota_fault_is_reported_not_raised() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let local = Arc::new(MemoryLocalStore::with_quota(64));
        let store = store_with(Arc::new(MemoryCookieStore::new()), local).with_fault_sink(tx);

        let big = "x".repeat(200);
        store.write_stored("ssCart", &big, None);

        let fault = rx.try_recv().unwrap();
        assert_eq!(fault.key, "ssCart");
        assert_eq!(fault.value, format!("\"{}\"", big));
        assert!(rx.try_recv().is_err());
    }
}
