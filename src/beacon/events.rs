// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Public event API.
//!
//! Each method stamps a fresh context, routes the request by its endpoint
//! and returns the request id. None of them fail: problems are logged and
//! the event is dropped or degraded, never surfaced to the host.

use tracing::debug;

use crate::event::{
    AddtocartSchemaData, CartProduct, CartSchemaData, Endpoint, ErrorLogData, EventData,
    EventPayload, OrderTransactionSchemaData, Payload, PayloadRequest, ProductIdentity,
    ProductPageviewSchemaData, RecommendationsSchemaData, RedirectSchemaData, SearchSchemaData,
    ShopperLoginData,
};
use crate::metrics;

use super::Beacon;

impl Beacon {
    /// Build, stamp and route one event.
    fn track(&self, endpoint: Endpoint, site_id: Option<String>, data: EventData) -> String {
        let site_id = site_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.inner.globals.site_id.clone());

        let request = PayloadRequest::new(
            endpoint,
            site_id,
            EventPayload {
                context: self.inner.context.context(),
                data,
            },
        );
        let id = request.id.clone();
        let batched = endpoint.is_batchable();
        metrics::record_event(endpoint.api_type().as_str(), endpoint.name(), batched);
        debug!(endpoint = %endpoint, batched, "Event tracked");

        if batched {
            self.inner.enqueue(request);
        } else {
            self.inner.dispatch(request);
        }
        id
    }

    fn search_like(&self, endpoint: Endpoint, event: Payload<SearchSchemaData>) -> String {
        self.track(endpoint, event.site_id, EventData::Search(event.data))
    }

    /// Add-to-cart from a results surface also lands in the local cart.
    fn add_to_cart_from(&self, endpoint: Endpoint, event: Payload<AddtocartSchemaData>) -> String {
        let products = event.data.results.clone();
        let id = self.track(endpoint, event.site_id, EventData::Addtocart(event.data));
        self.cart().add(products);
        id
    }

    pub(super) fn login(&self, site_id: Option<String>, shopper_id: &str) -> Option<String> {
        if !self.inner.context.set_shopper_id(shopper_id) {
            return None;
        }
        self.inner.schedule_preflight();
        Some(self.track(Endpoint::Login, site_id, EventData::Login))
    }

    // ───────────────────────────── shopper ─────────────────────────────

    /// Login with the shopper's id. `None` when the id is empty or already
    /// the current shopper.
    pub fn shopper_login(&self, event: Payload<ShopperLoginData>) -> Option<String> {
        self.login(event.site_id, &event.data.id)
    }

    // ───────────────────────────── autocomplete ─────────────────────────────

    pub fn autocomplete_render(&self, event: Payload<SearchSchemaData>) -> String {
        self.search_like(Endpoint::AutocompleteRender, event)
    }

    pub fn autocomplete_impression(&self, event: Payload<SearchSchemaData>) -> String {
        self.search_like(Endpoint::AutocompleteImpression, event)
    }

    pub fn autocomplete_click_through(&self, event: Payload<SearchSchemaData>) -> String {
        self.search_like(Endpoint::AutocompleteClickthrough, event)
    }

    pub fn autocomplete_add_to_cart(&self, event: Payload<AddtocartSchemaData>) -> String {
        self.add_to_cart_from(Endpoint::AutocompleteAddtocart, event)
    }

    pub fn autocomplete_redirect(&self, event: Payload<RedirectSchemaData>) -> String {
        self.track(Endpoint::AutocompleteRedirect, event.site_id, EventData::Redirect(event.data))
    }

    // ───────────────────────────── search ─────────────────────────────

    pub fn search_render(&self, event: Payload<SearchSchemaData>) -> String {
        self.search_like(Endpoint::SearchRender, event)
    }

    pub fn search_impression(&self, event: Payload<SearchSchemaData>) -> String {
        self.search_like(Endpoint::SearchImpression, event)
    }

    pub fn search_click_through(&self, event: Payload<SearchSchemaData>) -> String {
        self.search_like(Endpoint::SearchClickthrough, event)
    }

    pub fn search_add_to_cart(&self, event: Payload<AddtocartSchemaData>) -> String {
        self.add_to_cart_from(Endpoint::SearchAddtocart, event)
    }

    pub fn search_redirect(&self, event: Payload<RedirectSchemaData>) -> String {
        self.track(Endpoint::SearchRedirect, event.site_id, EventData::Redirect(event.data))
    }

    // ───────────────────────────── category ─────────────────────────────

    pub fn category_render(&self, event: Payload<SearchSchemaData>) -> String {
        self.search_like(Endpoint::CategoryRender, event)
    }

    pub fn category_impression(&self, event: Payload<SearchSchemaData>) -> String {
        self.search_like(Endpoint::CategoryImpression, event)
    }

    pub fn category_click_through(&self, event: Payload<SearchSchemaData>) -> String {
        self.search_like(Endpoint::CategoryClickthrough, event)
    }

    pub fn category_add_to_cart(&self, event: Payload<AddtocartSchemaData>) -> String {
        self.add_to_cart_from(Endpoint::CategoryAddtocart, event)
    }

    // ───────────────────────────── recommendations ─────────────────────────────

    pub fn recommendations_render(&self, event: Payload<RecommendationsSchemaData>) -> String {
        self.track(
            Endpoint::RecommendationsRender,
            event.site_id,
            EventData::Recommendations(event.data),
        )
    }

    pub fn recommendations_impression(&self, event: Payload<RecommendationsSchemaData>) -> String {
        self.track(
            Endpoint::RecommendationsImpression,
            event.site_id,
            EventData::Recommendations(event.data),
        )
    }

    pub fn recommendations_click_through(&self, event: Payload<RecommendationsSchemaData>) -> String {
        self.track(
            Endpoint::RecommendationsClickthrough,
            event.site_id,
            EventData::Recommendations(event.data),
        )
    }

    pub fn recommendations_add_to_cart(&self, event: Payload<AddtocartSchemaData>) -> String {
        self.add_to_cart_from(Endpoint::RecommendationsAddtocart, event)
    }

    // ───────────────────────────── product ─────────────────────────────

    /// Also moves the product to the front of the viewed list.
    pub fn product_page_view(&self, event: Payload<ProductPageviewSchemaData>) -> String {
        let product_id = event.data.result.product_id();
        let id = self.track(
            Endpoint::ProductPageview,
            event.site_id,
            EventData::ProductPageview(event.data),
        );
        self.viewed().add([product_id]);
        id
    }

    // ───────────────────────────── cart ─────────────────────────────

    /// A supplied full `cart` replaces the local one; otherwise the
    /// results are merged in.
    pub fn cart_add(&self, event: Payload<CartSchemaData>) -> String {
        let (results, cart) = cart_lists(&event.data);
        let id = self.track(Endpoint::CartAdd, event.site_id, EventData::Cart(event.data));
        match cart {
            Some(cart) => self.cart().set(cart),
            None => self.cart().add(results),
        };
        id
    }

    pub fn cart_remove(&self, event: Payload<CartSchemaData>) -> String {
        let (results, cart) = cart_lists(&event.data);
        let id = self.track(Endpoint::CartRemove, event.site_id, EventData::Cart(event.data));
        match cart {
            Some(cart) => self.cart().set(cart),
            None => self.cart().remove(results),
        };
        id
    }

    /// The viewed cart is the whole cart.
    pub fn cart_view(&self, event: Payload<CartSchemaData>) -> String {
        let (results, cart) = cart_lists(&event.data);
        let id = self.track(Endpoint::CartView, event.site_id, EventData::Cart(event.data));
        self.cart().set(cart.unwrap_or(results));
        id
    }

    // ───────────────────────────── order ─────────────────────────────

    /// A completed order empties the cart.
    pub fn order_transaction(&self, event: Payload<OrderTransactionSchemaData>) -> String {
        let id = self.track(Endpoint::OrderTransaction, event.site_id, EventData::Order(event.data));
        self.cart().clear();
        id
    }

    // ───────────────────────────── error ─────────────────────────────

    pub fn error_snap(&self, event: Payload<ErrorLogData>) -> String {
        self.track(Endpoint::LogSnap, event.site_id, EventData::Log(event.data))
    }

    /// Errors raised inside a storefront pixel extension.
    pub fn error_shopifypixel(&self, event: Payload<ErrorLogData>) -> String {
        self.track(Endpoint::LogShopifypixel, event.site_id, EventData::Log(event.data))
    }
}

fn cart_lists(data: &CartSchemaData) -> (Vec<CartProduct>, Option<Vec<CartProduct>>) {
    (data.results.clone(), data.cart.clone())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::{BeaconConfig, Globals, Mode};
    use crate::event::Item;
    use crate::storage::memory::{MemoryCookieStore, MemoryLocalStore};
    use crate::transport::{RecordingTransport, CONTENT_TYPE_TEXT};
    use crate::Backends;

    fn beacon_with(config: BeaconConfig) -> (Beacon, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let backends = Backends::new(transport.clone())
            .with_cookies(Arc::new(MemoryCookieStore::new()))
            .with_local(Arc::new(MemoryLocalStore::new()));
        let beacon = Beacon::new(Globals::new("abc123"), config, backends).unwrap();
        (beacon, transport)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1_000)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interactive_events_dispatch_immediately() {
        let (beacon, transport) = beacon_with(BeaconConfig::default());

        beacon.search_click_through(Payload::new(SearchSchemaData::new(vec![Item::new("a")])));
        beacon.search_click_through(Payload::new(SearchSchemaData::new(vec![Item::new("a")])));
        assert_eq!(beacon.pending_requests(), 0);

        settle().await;
        assert_eq!(transport.for_endpoint(Endpoint::SearchClickthrough).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_request_shape() {
        let (beacon, transport) = beacon_with(BeaconConfig::default());
        beacon.search_redirect(Payload::new(RedirectSchemaData::new("https://example.com/sale")));
        settle().await;

        let request = &transport.for_endpoint(Endpoint::SearchRedirect)[0];
        assert_eq!(
            request.url,
            "https://beacon.searchspring.io/beacon/v2/abc123/search/redirect"
        );
        assert_eq!(request.content_type, CONTENT_TYPE_TEXT);
        assert!(request.keepalive);

        let body = request.json().unwrap();
        assert_eq!(body["data"]["redirect"], "https://example.com/sale");
        assert_eq!(body["context"]["userId"], beacon.user_id());
        assert!(body["context"].get("dev").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_development_mode() {
        let (beacon, transport) = beacon_with(BeaconConfig {
            mode: Mode::Development,
            ..Default::default()
        });
        beacon.error_snap(Payload::new(ErrorLogData {
            message: "boom".into(),
            ..Default::default()
        }));
        settle().await;

        let request = &transport.for_endpoint(Endpoint::LogSnap)[0];
        assert!(!request.keepalive);
        assert_eq!(request.json().unwrap()["context"]["dev"], true);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_channels_route_separately() {
        let (beacon, transport) = beacon_with(BeaconConfig::default());
        let data = ErrorLogData {
            message: "test-message".into(),
            stack: Some("test-stack".into()),
            details: Some(serde_json::json!({"test": "test"})),
        };
        beacon.error_shopifypixel(Payload::new(data.clone()));
        beacon.error_snap(Payload::new(data));
        settle().await;

        let pixel = transport.for_endpoint(Endpoint::LogShopifypixel);
        assert_eq!(pixel.len(), 1);
        assert!(pixel[0].url.ends_with("/beacon/v2/abc123/error/shopifypixel"));
        let body = pixel[0].json().unwrap();
        assert_eq!(body["data"]["message"], "test-message");
        assert_eq!(body["data"]["stack"], "test-stack");
        assert_eq!(body["data"]["details"]["test"], "test");
        assert_eq!(transport.for_endpoint(Endpoint::LogSnap).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_site_id_override() {
        let (beacon, transport) = beacon_with(BeaconConfig::default());
        beacon.search_click_through(
            Payload::new(SearchSchemaData::default()).with_site_id("zzz999"),
        );
        beacon.search_click_through(Payload::new(SearchSchemaData::default()).with_site_id("  "));
        settle().await;

        let urls: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
        assert!(urls[0].contains("/zzz999/"));
        assert!(urls[1].contains("/abc123/"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_only_on_new_shopper() {
        let (beacon, transport) = beacon_with(BeaconConfig::default());

        assert!(beacon.shopper_login(Payload::new(ShopperLoginData { id: "".into() })).is_none());
        assert!(beacon.shopper_login(Payload::new(ShopperLoginData { id: "s1".into() })).is_some());
        assert!(beacon.shopper_login(Payload::new(ShopperLoginData { id: "s1".into() })).is_none());
        settle().await;

        let logins = transport.for_endpoint(Endpoint::Login);
        assert_eq!(logins.len(), 1);
        let body = logins[0].json().unwrap();
        assert_eq!(body["context"]["shopperId"], "s1");
        assert!(body.get("data").is_none());
        assert!(logins[0].url.ends_with("/shopper/login"));

        let preflights = transport.preflights();
        assert_eq!(preflights.len(), 1);
        assert_eq!(preflights[0].json().unwrap()["shopper"], "s1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_to_cart_events_update_cart() {
        let (beacon, _transport) = beacon_with(BeaconConfig::default());
        beacon.search_add_to_cart(Payload::new(AddtocartSchemaData::new(vec![
            CartProduct::new("p1", 1, 10.0),
        ])));
        beacon.recommendations_add_to_cart(Payload::new(AddtocartSchemaData::new(vec![
            CartProduct::new("p1", 1, 10.0),
        ])));
        assert_eq!(beacon.cart().get(), vec![CartProduct::new("p1", 2, 10.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cart_events_update_cart() {
        let (beacon, _transport) = beacon_with(BeaconConfig::default());

        beacon.cart_add(Payload::new(CartSchemaData::new(vec![CartProduct::new("p1", 2, 5.0)])));
        beacon.cart_remove(Payload::new(CartSchemaData::new(vec![CartProduct::new("p1", 1, 5.0)])));
        assert_eq!(beacon.cart().get(), vec![CartProduct::new("p1", 1, 5.0)]);

        // A full cart replaces local state
        beacon.cart_add(Payload::new(
            CartSchemaData::new(vec![CartProduct::new("p2", 1, 1.0)])
                .with_cart(vec![CartProduct::new("p2", 1, 1.0), CartProduct::new("p3", 4, 2.0)]),
        ));
        assert_eq!(beacon.cart().product_ids(), vec!["p2", "p3"]);

        beacon.cart_view(Payload::new(CartSchemaData::new(vec![CartProduct::new("p9", 1, 9.0)])));
        assert_eq!(beacon.cart().product_ids(), vec!["p9"]);

        beacon.order_transaction(Payload::new(OrderTransactionSchemaData::default()));
        assert!(beacon.cart().get().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_product_page_view_updates_viewed() {
        let (beacon, transport) = beacon_with(BeaconConfig::default());
        beacon.product_page_view(Payload::new(ProductPageviewSchemaData::new(
            Item::new("p1").with_sku("sku-1"),
        )));
        beacon.product_page_view(Payload::new(ProductPageviewSchemaData::new(Item::new("p2"))));
        assert_eq!(beacon.viewed().get(), vec!["p2", "p1"]);
        settle().await;

        let preflights = transport.preflights();
        assert_eq!(preflights.len(), 1);
        assert_eq!(preflights[0].json().unwrap()["lastViewed"], serde_json::json!(["p2", "p1"]));
    }
}
