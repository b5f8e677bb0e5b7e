//! # Beacon Engine
//!
//! Client-embedded event tracking for e-commerce search and personalization.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Public Event API                       │
//! │  • search/autocomplete/category/recommendations events     │
//! │  • product, cart, order, login, error events               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Context Resolver                        │
//! │  • user / session / page-load / shopper ids                │
//! │  • attribution, currency, fresh timestamp                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              (render/impression: sliding batch window)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Batching & Deduplication                   │
//! │  • one outbound call per batch key                         │
//! │  • results/banners appended in arrival order               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Transport                           │
//! │  • fire and forget, never retried                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart and recently-viewed state is mirrored into cookies and a structured
//! local store; any real change schedules a debounced preflight call that
//! warms the personalization cache.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use beacon_engine::{
//!     Backends, Beacon, BeaconConfig, CartProduct, CartSchemaData, Globals, HttpTransport,
//!     MemoryCookieStore, MemoryLocalStore, Payload,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = Arc::new(HttpTransport::new().expect("HTTP client"));
//!     let backends = Backends::new(transport)
//!         .with_cookies(Arc::new(MemoryCookieStore::new()))
//!         .with_local(Arc::new(MemoryLocalStore::new()));
//!
//!     let config = BeaconConfig {
//!         href: Some("https://www.example.com/product/p1".into()),
//!         ..Default::default()
//!     };
//!     let beacon = Beacon::new(Globals::new("abc123"), config, backends).expect("site id");
//!
//!     beacon.cart_add(Payload::new(CartSchemaData::new(vec![CartProduct::new("p1", 1, 19.99)])));
//!     assert_eq!(beacon.cart().product_ids(), vec!["p1"]);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`beacon`]: The [`Beacon`] orchestrator and public event API
//! - [`context`]: Identity and per-event context
//! - [`state`]: Cart and viewed lists
//! - [`batching`]: Pool, batch keys, merge and debounce timer
//! - [`preflight`]: Cache warming request
//! - [`storage`]: Cookie and structured-store persistence
//! - [`transport`]: Outbound delivery (reqwest, recording)
//! - [`event`]: Endpoints and payload data

pub mod batching;
pub mod beacon;
pub mod clock;
pub mod config;
pub mod context;
pub mod event;
pub mod metrics;
pub mod preflight;
pub mod state;
pub mod storage;
pub mod transport;

pub use beacon::{Backends, Beacon, BeaconError, CartHandle, ViewedHandle};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BeaconConfig, Globals, Mode};
pub use context::{Attribution, Context, Currency};
pub use event::{
    AddtocartSchemaData, ApiType, Banner, CartProduct, CartSchemaData, Endpoint, ErrorLogData,
    EventData, EventPayload, Item, OrderTransactionSchemaData, Pagination, Payload,
    PayloadRequest, ProductIdentity, ProductPageviewSchemaData, RecommendationsSchemaData,
    RedirectSchemaData, SearchSchemaData, ShopperLoginData,
};
pub use preflight::PreflightRequest;
pub use storage::memory::{MemoryCookieStore, MemoryLocalStore};
pub use storage::traits::{CookieStore, LocalStore, StorageError};
pub use transport::{HttpTransport, OutboundRequest, RecordingTransport, Transport, TransportError};
