// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Identity and per-event context resolution.
//!
//! Identity fields each carry their own expiration policy:
//!
//! | Field          | Key             | Expiration                  |
//! |----------------|-----------------|-----------------------------|
//! | `userId`       | `ssUserId`      | 18 months                   |
//! | `sessionId`    | `ssSessionId`   | 30 minutes, sliding         |
//! | `pageLoadId`   | `ssPageLoadId`  | 10 seconds, bound to URL    |
//! | `shopperId`    | `ssShopperId`   | 18 months, explicit only    |
//! | `attribution`  | `ssAttribution` | 30 minutes                  |
//!
//! Each field is derived from storage at most once per page life and then
//! served from memory; only the timestamp is recomputed per event.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::clock::{parse_timestamp, to_timestamp};
use crate::storage::facade::PersistentStore;

pub const USER_ID_KEY: &str = "ssUserId";
pub const SESSION_ID_KEY: &str = "ssSessionId";
pub const PAGE_LOAD_ID_KEY: &str = "ssPageLoadId";
pub const SHOPPER_ID_KEY: &str = "ssShopperId";
pub const ATTRIBUTION_KEY: &str = "ssAttribution";
pub const ATTRIBUTION_QUERY_PARAM: &str = "ss_attribution";

/// 18 months
pub const MAX_EXPIRATION: Duration = Duration::from_millis(47_304_000_000);
pub const SESSION_EXPIRATION: Duration = Duration::from_secs(30 * 60);
pub const PAGE_LOAD_ID_EXPIRATION: Duration = Duration::from_secs(10);
pub const ATTRIBUTION_EXPIRATION: Duration = Duration::from_secs(30 * 60);

/// Campaign/source tracking tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl Attribution {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Parse `type:id`; both halves must be non-empty.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (kind, id) = raw.trim().split_once(':')?;
        (!kind.is_empty() && !id.is_empty()).then(|| Self::new(kind, id))
    }

    fn encode(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
}

impl Currency {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

/// Per-event metadata bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub user_id: String,
    pub session_id: String,
    pub page_load_id: String,
    pub shopper_id: String,
    pub timestamp: String,
    pub page_url: String,
    pub initiator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Vec<Attribution>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev: Option<bool>,
}

/// Static page facts stamped on every context.
#[derive(Debug, Clone, Default)]
pub struct PageInfo {
    pub page_url: String,
    pub initiator: String,
    pub user_agent: Option<String>,
    pub dev: bool,
}

#[derive(Debug, Clone)]
struct CachedSession {
    id: String,
    last_seen: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct IdentityCache {
    user_id: Option<String>,
    session: Option<CachedSession>,
    page_load_id: Option<String>,
    shopper_id: Option<String>,
    attribution: Option<Option<Vec<Attribution>>>,
    currency: Option<Currency>,
}

pub struct ContextResolver {
    store: Arc<PersistentStore>,
    page: PageInfo,
    cache: Mutex<IdentityCache>,
}

fn chrono_ttl(expiration: Duration) -> Option<chrono::Duration> {
    if expiration.is_zero() {
        None
    } else {
        chrono::Duration::from_std(expiration).ok()
    }
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

impl ContextResolver {
    pub fn new(store: Arc<PersistentStore>, page: PageInfo) -> Self {
        Self {
            store,
            page,
            cache: Mutex::new(IdentityCache::default()),
        }
    }

    #[must_use]
    pub fn page(&self) -> &PageInfo {
        &self.page
    }

    fn is_expired(&self, timestamp: &str, expiration: Duration, now: DateTime<Utc>) -> bool {
        if expiration.is_zero() {
            return false;
        }
        let Some(ttl) = chrono_ttl(expiration) else { return false };
        match parse_timestamp(timestamp) {
            Some(at) => at < now - ttl,
            None => true,
        }
    }

    /// Resolve a durable id: cookie, then an unexpired structured entry,
    /// then a fresh id. The result is always re-persisted to both backends
    /// with a fresh timestamp. A zero `expiration` never expires.
    pub fn get_stored_id(&self, key: &str, expiration: Duration) -> String {
        let now = self.store.now();
        let id = match self.store.cookie(key) {
            Some(cookie) => cookie,
            None => match self.store.read_stored::<String>(key) {
                Some(stored) if !stored.value.is_empty()
                    && !self.is_expired(&stored.timestamp, expiration, now) =>
                {
                    stored.value
                }
                Some(_) => {
                    debug!(key, "Stored id expired, minting a new one");
                    generate_id()
                }
                None => generate_id(),
            },
        };
        self.persist_id(key, &id, expiration);
        id
    }

    fn persist_id(&self, key: &str, id: &str, expiration: Duration) {
        self.store.set_cookie(key, id, chrono_ttl(expiration));
        self.store.write_stored(key, &id, None);
    }

    pub fn user_id(&self) -> String {
        if let Some(id) = self.cache.lock().user_id.clone() {
            return id;
        }
        let id = self.get_stored_id(USER_ID_KEY, MAX_EXPIRATION);
        self.cache.lock().user_id = Some(id.clone());
        id
    }

    /// Sliding session: every access pushes the expiry forward, and an
    /// in-memory session idle past its window is re-derived.
    pub fn session_id(&self) -> String {
        let now = self.store.now();
        let cached = self.cache.lock().session.clone();
        let ttl = chrono_ttl(SESSION_EXPIRATION).unwrap_or_else(chrono::Duration::zero);

        let id = match cached {
            Some(session) if now - session.last_seen <= ttl => {
                self.persist_id(SESSION_ID_KEY, &session.id, SESSION_EXPIRATION);
                session.id
            }
            _ => self.get_stored_id(SESSION_ID_KEY, SESSION_EXPIRATION),
        };
        self.cache.lock().session = Some(CachedSession {
            id: id.clone(),
            last_seen: now,
        });
        id
    }

    /// Reused only when minted for this exact URL within the last 10 s.
    pub fn page_load_id(&self) -> String {
        if let Some(id) = self.cache.lock().page_load_id.clone() {
            return id;
        }
        let now = self.store.now();
        let reusable = self
            .store
            .read_stored::<String>(PAGE_LOAD_ID_KEY)
            .filter(|stored| stored.href.as_deref() == Some(self.page.page_url.as_str()))
            .filter(|stored| !self.is_expired(&stored.timestamp, PAGE_LOAD_ID_EXPIRATION, now))
            .map(|stored| stored.value)
            .filter(|id| !id.is_empty());

        let id = reusable.unwrap_or_else(generate_id);
        self.store
            .write_stored(PAGE_LOAD_ID_KEY, &id, Some(&self.page.page_url));
        self.cache.lock().page_load_id = Some(id.clone());
        id
    }

    /// Empty when no shopper has logged in.
    pub fn shopper_id(&self) -> String {
        if let Some(id) = self.cache.lock().shopper_id.clone() {
            return id;
        }
        let id = self.store.read(SHOPPER_ID_KEY).unwrap_or_default();
        self.cache.lock().shopper_id = Some(id.clone());
        id
    }

    /// Persist a new shopper id. Returns `false` (and does nothing) for an
    /// empty id or one equal to the current value.
    pub fn set_shopper_id(&self, shopper_id: &str) -> bool {
        let shopper_id = shopper_id.trim();
        if shopper_id.is_empty() {
            warn!("Shopper id is required when setting the shopper");
            return false;
        }
        if self.shopper_id() == shopper_id {
            return false;
        }
        self.store
            .set_cookie(SHOPPER_ID_KEY, shopper_id, chrono_ttl(MAX_EXPIRATION));
        self.store.write_stored(SHOPPER_ID_KEY, &shopper_id, None);
        self.cache.lock().shopper_id = Some(shopper_id.to_string());
        true
    }

    fn url_attribution(&self) -> Vec<Attribution> {
        let Ok(url) = Url::parse(&self.page.page_url) else {
            return Vec::new();
        };
        url.query_pairs()
            .filter(|(name, _)| name == ATTRIBUTION_QUERY_PARAM)
            .flat_map(|(_, value)| {
                value
                    .split(',')
                    .filter_map(Attribution::parse)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn stored_attribution(&self) -> Vec<Attribution> {
        let now = self.store.now();
        let from_local = || {
            self.store
                .read_stored::<Vec<Attribution>>(ATTRIBUTION_KEY)
                .filter(|stored| !self.is_expired(&stored.timestamp, ATTRIBUTION_EXPIRATION, now))
                .map(|stored| stored.value)
        };
        let from_cookie = || {
            self.store
                .cookie(ATTRIBUTION_KEY)
                .map(|raw| raw.split(',').filter_map(Attribution::parse).collect())
        };
        from_local().or_else(from_cookie).unwrap_or_default()
    }

    /// URL-supplied entries first, then previously stored ones, deduplicated
    /// by `type` + `id`. `None` when there is nothing.
    pub fn attribution(&self) -> Option<Vec<Attribution>> {
        if let Some(resolved) = self.cache.lock().attribution.clone() {
            return resolved;
        }

        let mut merged: Vec<Attribution> = Vec::new();
        for entry in self.url_attribution().into_iter().chain(self.stored_attribution()) {
            if !merged.contains(&entry) {
                merged.push(entry);
            }
        }

        let resolved = if merged.is_empty() {
            None
        } else {
            let cookie_value = merged.iter().map(Attribution::encode).collect::<Vec<_>>().join(",");
            self.store
                .set_cookie(ATTRIBUTION_KEY, &cookie_value, chrono_ttl(ATTRIBUTION_EXPIRATION));
            self.store.write_stored(ATTRIBUTION_KEY, &merged, None);
            Some(merged)
        };
        self.cache.lock().attribution = Some(resolved.clone());
        resolved
    }

    pub fn set_currency(&self, currency: Currency) {
        self.cache.lock().currency = Some(currency);
    }

    /// Set only when a non-empty code was supplied.
    #[must_use]
    pub fn currency(&self) -> Option<Currency> {
        self.cache
            .lock()
            .currency
            .clone()
            .filter(|currency| !currency.code.is_empty())
    }

    /// Fresh context for one event; the timestamp is always current.
    pub fn context(&self) -> Context {
        Context {
            user_id: self.user_id(),
            session_id: self.session_id(),
            page_load_id: self.page_load_id(),
            shopper_id: self.shopper_id(),
            timestamp: to_timestamp(self.store.now()),
            page_url: self.page.page_url.clone(),
            initiator: self.page.initiator.clone(),
            user_agent: self.page.user_agent.clone(),
            attribution: self.attribution(),
            currency: self.currency(),
            dev: self.page.dev.then_some(true),
        }
    }

    /// Context built from in-memory values only, never touching storage.
    #[must_use]
    pub fn snapshot(&self) -> Context {
        let cache = self.cache.lock();
        Context {
            user_id: cache.user_id.clone().unwrap_or_default(),
            session_id: cache
                .session
                .as_ref()
                .map(|session| session.id.clone())
                .unwrap_or_default(),
            page_load_id: cache.page_load_id.clone().unwrap_or_default(),
            shopper_id: cache.shopper_id.clone().unwrap_or_default(),
            timestamp: to_timestamp(self.store.now()),
            page_url: self.page.page_url.clone(),
            initiator: self.page.initiator.clone(),
            user_agent: self.page.user_agent.clone(),
            attribution: cache.attribution.clone().flatten(),
            currency: cache.currency.clone().filter(|currency| !currency.code.is_empty()),
            dev: self.page.dev.then_some(true),
        }
    }
}
