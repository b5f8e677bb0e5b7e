// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Beacon orchestrator.
//!
//! The [`Beacon`] ties the pieces together:
//! - [`ContextResolver`] stamps every event with identity and page context
//! - render/impression events wait in the [`PayloadPool`] for the batching
//!   window, everything else is dispatched at once
//! - cart and viewed mutations schedule a debounced preflight
//! - storage quota faults come back in as error events
//!
//! # Flow
//!
//! ```text
//!   event call ──► context() ──► batchable? ──yes──► pool ──(window)──► merge ──┐
//!                                    │ no                                       │
//!                                    └──────────────────────────────────────────┴──► transport
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use beacon_engine::{
//!     Backends, Beacon, BeaconConfig, Globals, Item, MemoryCookieStore, MemoryLocalStore,
//!     Payload, RecordingTransport, SearchSchemaData,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let transport = Arc::new(RecordingTransport::new());
//! let backends = Backends::new(transport.clone())
//!     .with_cookies(Arc::new(MemoryCookieStore::new()))
//!     .with_local(Arc::new(MemoryLocalStore::new()));
//!
//! let beacon = Beacon::new(Globals::new("abc123"), BeaconConfig::default(), backends)
//!     .expect("valid site id");
//!
//! beacon.search_render(Payload::new(
//!     SearchSchemaData::new(vec![Item::new("p1")]).with_response_id("r1"),
//! ));
//! # }
//! ```

mod cart_api;
mod dispatch;
mod events;
mod types;

pub use cart_api::{CartHandle, ViewedHandle};
pub use types::{Backends, BeaconError};

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::info;

use crate::batching::{Debouncer, PayloadPool};
use crate::clock::{Clock, SystemClock};
use crate::config::{BeaconConfig, Globals};
use crate::context::{Attribution, Context, ContextResolver, Currency, PageInfo};
use crate::state::{CartStore, ViewedStore};
use crate::storage::cookie::CookiePolicy;
use crate::storage::facade::{Capabilities, PersistentStore};
use crate::transport::Transport;

/// Event tracking agent. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Beacon {
    pub(super) inner: Arc<Inner>,
}

pub(super) struct Inner {
    pub(super) globals: Globals,
    pub(super) config: BeaconConfig,
    pub(super) runtime: Handle,
    pub(super) store: Arc<PersistentStore>,
    pub(super) context: ContextResolver,
    pub(super) cart: CartStore,
    pub(super) viewed: ViewedStore,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) pool: Mutex<PayloadPool>,
    pub(super) batch_timer: Debouncer,
    pub(super) preflight_timer: Debouncer,
}

impl Beacon {
    /// Build a beacon for `globals.site_id`.
    ///
    /// Must be called from within a tokio runtime: timers and dispatch are
    /// spawned onto the runtime current at construction.
    pub fn new(globals: Globals, config: BeaconConfig, backends: Backends) -> Result<Self, BeaconError> {
        let site_id = globals.site_id.trim().to_string();
        if site_id.is_empty() {
            return Err(BeaconError::InvalidSiteId);
        }
        let globals = Globals { site_id, ..globals };
        let runtime = Handle::try_current().map_err(|_| BeaconError::NoRuntime)?;

        let clock: Arc<dyn Clock> = backends.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let (fault_tx, fault_rx) = mpsc::unbounded_channel();
        let store = Arc::new(
            PersistentStore::new(
                backends.cookies,
                backends.local,
                CookiePolicy::for_page(config.page_url()),
                clock,
            )
            .with_fault_sink(fault_tx),
        );

        let page = PageInfo {
            page_url: config.page_url().to_string(),
            initiator: config.initiator(),
            user_agent: config.user_agent.clone(),
            dev: config.is_development(),
        };
        let context = ContextResolver::new(store.clone(), page);
        if let Some(currency) = globals.currency.clone() {
            context.set_currency(currency);
        }

        let inner = Arc::new(Inner {
            cart: CartStore::new(store.clone()),
            viewed: ViewedStore::new(store.clone()),
            batch_timer: Debouncer::new(config.batch_window(), runtime.clone()),
            preflight_timer: Debouncer::new(config.preflight_debounce(), runtime.clone()),
            pool: Mutex::new(PayloadPool::new()),
            transport: backends.transport,
            context,
            store,
            runtime,
            config,
            globals,
        });
        inner.spawn_fault_reporter(fault_rx);

        info!(
            site_id = %inner.globals.site_id,
            mode = ?inner.config.mode,
            cookies = inner.store.capabilities().cookies,
            storage = inner.store.capabilities().storage,
            "Beacon initialized"
        );
        Ok(Self { inner })
    }

    /// Build from loosely typed globals, e.g. a host-supplied JSON object.
    pub fn from_json(
        globals: serde_json::Value,
        config: BeaconConfig,
        backends: Backends,
    ) -> Result<Self, BeaconError> {
        let globals: Globals = serde_json::from_value(globals)?;
        Self::new(globals, config, backends)
    }

    #[must_use]
    pub fn globals(&self) -> &Globals {
        &self.inner.globals
    }

    #[must_use]
    pub fn config(&self) -> &BeaconConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.inner.store.capabilities()
    }

    /// Fresh context, as the next event would carry it.
    #[must_use]
    pub fn context(&self) -> Context {
        self.inner.context.context()
    }

    pub fn user_id(&self) -> String {
        self.inner.context.user_id()
    }

    pub fn session_id(&self) -> String {
        self.inner.context.session_id()
    }

    pub fn page_load_id(&self) -> String {
        self.inner.context.page_load_id()
    }

    pub fn shopper_id(&self) -> String {
        self.inner.context.shopper_id()
    }

    pub fn attribution(&self) -> Option<Vec<Attribution>> {
        self.inner.context.attribution()
    }

    pub fn set_currency(&self, currency: Currency) {
        self.inner.context.set_currency(currency);
    }

    /// Identify the shopper. A new id is persisted, a preflight scheduled
    /// and a login event dispatched; an empty or unchanged id does nothing.
    pub fn set_shopper_id(&self, shopper_id: &str) -> bool {
        self.login(None, shopper_id).is_some()
    }

    #[must_use]
    pub fn cart(&self) -> CartHandle<'_> {
        CartHandle::new(self)
    }

    #[must_use]
    pub fn viewed(&self) -> ViewedHandle<'_> {
        ViewedHandle::new(self)
    }

    /// Send the preflight now with the current state, skipping the debounce.
    pub fn send_preflight(&self) {
        self.inner.preflight_timer.cancel();
        self.inner.send_preflight();
    }

    /// Requests waiting for the batching window to close.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.inner.pool.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{MemoryCookieStore, MemoryLocalStore};
    use crate::transport::RecordingTransport;

    fn backends() -> Backends {
        Backends::new(Arc::new(RecordingTransport::new()))
            .with_cookies(Arc::new(MemoryCookieStore::new()))
            .with_local(Arc::new(MemoryLocalStore::new()))
    }

    #[tokio::test]
    async fn test_blank_site_id_rejected() {
        for site_id in ["", "   "] {
            let result = Beacon::new(Globals::new(site_id), BeaconConfig::default(), backends());
            assert!(matches!(result, Err(BeaconError::InvalidSiteId)));
        }
    }

    #[tokio::test]
    async fn test_from_json_validates_site_id() {
        let result = Beacon::from_json(
            serde_json::json!({"siteId": 42}),
            BeaconConfig::default(),
            backends(),
        );
        assert!(matches!(result, Err(BeaconError::InvalidGlobals(_))));

        let result = Beacon::from_json(serde_json::json!({}), BeaconConfig::default(), backends());
        assert!(matches!(result, Err(BeaconError::InvalidGlobals(_))));

        let beacon = Beacon::from_json(
            serde_json::json!({"siteId": " abc123 ", "currency": {"code": "USD"}}),
            BeaconConfig::default(),
            backends(),
        )
        .unwrap();
        assert_eq!(beacon.globals().site_id, "abc123");
        assert_eq!(beacon.context().currency, Some(Currency::new("USD")));
    }

    #[test]
    fn test_requires_runtime() {
        let result = Beacon::new(Globals::new("abc123"), BeaconConfig::default(), backends());
        assert!(matches!(result, Err(BeaconError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_runs_without_any_storage() {
        let beacon = Beacon::new(
            Globals::new("abc123"),
            BeaconConfig::default(),
            Backends::new(Arc::new(RecordingTransport::new())),
        )
        .unwrap();
        assert!(!beacon.capabilities().any());
        assert!(!beacon.user_id().is_empty());
        assert!(beacon.cart().get().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let beacon = Beacon::new(Globals::new("abc123"), BeaconConfig::default(), backends()).unwrap();
        let clone = beacon.clone();
        assert_eq!(beacon.user_id(), clone.user_id());
        assert!(clone.set_shopper_id("shopper-1"));
        assert_eq!(beacon.shopper_id(), "shopper-1");
    }
}
