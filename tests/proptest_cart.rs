//! Property-based tests for cart arithmetic, the viewed list and batch merging.
//!
//! Uses proptest to generate random mutation sequences and event bursts and
//! checks the invariants hold for all of them.
//!
//! Run with: `cargo test --test proptest_cart`

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;

use beacon_engine::batching::partition_and_merge;
use beacon_engine::state::{CartStore, ViewedStore, MAX_VIEWED_COUNT};
use beacon_engine::storage::cookie::CookiePolicy;
use beacon_engine::storage::facade::PersistentStore;
use beacon_engine::{
    CartProduct, Context, Endpoint, EventData, EventPayload, Item, ManualClock, MemoryCookieStore,
    MemoryLocalStore, PayloadRequest, SearchSchemaData,
};

// =============================================================================
// Fixtures
// =============================================================================

fn store() -> Arc<PersistentStore> {
    let clock = Arc::new(ManualClock::default());
    Arc::new(PersistentStore::new(
        Some(Arc::new(MemoryCookieStore::with_clock(clock.clone()))),
        Some(Arc::new(MemoryLocalStore::new())),
        CookiePolicy::for_page("https://www.example.com/"),
        clock,
    ))
}

fn context() -> Context {
    Context {
        user_id: "user-1".into(),
        session_id: "session-1".into(),
        page_load_id: "page-1".into(),
        shopper_id: String::new(),
        timestamp: "2026-01-01T00:00:00.000Z".into(),
        page_url: "https://www.example.com/search".into(),
        initiator: "searchspring/snap/preact".into(),
        user_agent: None,
        attribution: None,
        currency: None,
        dev: None,
    }
}

fn impression(response_id: &str, uids: &[String]) -> PayloadRequest {
    let results = uids.iter().map(|uid| Item::new(uid.as_str())).collect();
    PayloadRequest::new(
        Endpoint::SearchImpression,
        "abc123",
        EventPayload {
            context: context(),
            data: EventData::Search(SearchSchemaData::new(results).with_response_id(response_id)),
        },
    )
}

fn uids(request: &PayloadRequest) -> Vec<String> {
    match &request.payload.data {
        EventData::Search(search) => search.results.iter().map(|i| i.uid.clone()).collect(),
        _ => Vec::new(),
    }
}

// =============================================================================
// Strategies
// =============================================================================

/// A small id space so lines collide often
fn cart_line_strategy() -> impl Strategy<Value = (String, u32)> {
    ("p[0-4]", 1u32..5)
}

fn burst_strategy() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    prop::collection::vec(
        ("r[1-3]", prop::collection::vec("[a-z]{1,4}", 0..4)),
        1..20,
    )
}

// =============================================================================
// Cart
// =============================================================================

proptest! {
    #[test]
    fn prop_cart_quantity_is_sum_of_adds(lines in prop::collection::vec(cart_line_strategy(), 1..30)) {
        let cart = CartStore::new(store());
        let mut expected: HashMap<String, u32> = HashMap::new();

        for (uid, qty) in &lines {
            cart.add(vec![CartProduct::new(uid.as_str(), *qty, 1.0)]);
            *expected.entry(uid.clone()).or_default() += qty;
        }

        let stored = cart.get();
        prop_assert_eq!(stored.len(), expected.len());
        for product in &stored {
            prop_assert_eq!(Some(&product.qty), expected.get(&product.uid));
        }
        // New lines are prepended, so the earliest one ends up last
        prop_assert_eq!(&stored[stored.len() - 1].uid, &lines[0].0);
    }

    #[test]
    fn prop_removing_everything_added_empties_cart(lines in prop::collection::vec(cart_line_strategy(), 1..20)) {
        let cart = CartStore::new(store());
        for (uid, qty) in &lines {
            cart.add(vec![CartProduct::new(uid.as_str(), *qty, 1.0)]);
        }
        for (uid, qty) in &lines {
            cart.remove(vec![CartProduct::new(uid.as_str(), *qty, 1.0)]);
        }

        prop_assert!(cart.get().is_empty());
        prop_assert!(cart.product_ids().is_empty());
    }

    #[test]
    fn prop_quantity_is_adds_minus_removes(
        adds in prop::collection::vec(cart_line_strategy(), 0..20),
        removes in prop::collection::vec(cart_line_strategy(), 0..20),
    ) {
        let cart = CartStore::new(store());
        let mut net: HashMap<String, i64> = HashMap::new();
        for (uid, qty) in &adds {
            cart.add(vec![CartProduct::new(uid.as_str(), *qty, 1.0)]);
            *net.entry(uid.clone()).or_default() += i64::from(*qty);
        }
        for (uid, qty) in &removes {
            cart.remove(vec![CartProduct::new(uid.as_str(), *qty, 1.0)]);
            *net.entry(uid.clone()).or_default() -= i64::from(*qty);
        }

        let stored = cart.get();
        for (uid, expected) in &net {
            let line = stored.iter().find(|p| &p.uid == uid);
            if *expected > 0 {
                prop_assert_eq!(line.map(|p| i64::from(p.qty)), Some(*expected));
            } else {
                prop_assert!(line.is_none(), "{} should be gone at {}", uid, expected);
            }
        }
        prop_assert!(stored.iter().all(|p| p.qty > 0));
    }

    #[test]
    fn prop_cart_set_is_idempotent(lines in prop::collection::vec(cart_line_strategy(), 0..10)) {
        let cart = CartStore::new(store());
        let products: Vec<CartProduct> = lines
            .iter()
            .map(|(uid, qty)| CartProduct::new(uid.as_str(), *qty, 2.5))
            .collect();

        cart.set(products.clone());
        prop_assert!(!cart.set(products));
    }
}

// =============================================================================
// Viewed
// =============================================================================

proptest! {
    #[test]
    fn prop_viewed_is_bounded_unique_and_recent_first(ids in prop::collection::vec("v[0-9]{1,2}", 1..60)) {
        let viewed = ViewedStore::new(store());
        for id in &ids {
            viewed.add([id.as_str()]);
        }

        let list = viewed.get();
        prop_assert!(list.len() <= MAX_VIEWED_COUNT);
        prop_assert_eq!(&list[0], &ids[ids.len() - 1]);
        let mut deduped = list.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), list.len());
    }
}

// =============================================================================
// Batch merge
// =============================================================================

proptest! {
    #[test]
    fn prop_merge_concatenates_in_arrival_order(burst in burst_strategy()) {
        let requests: Vec<PayloadRequest> = burst
            .iter()
            .map(|(response_id, items)| impression(response_id, items))
            .collect();

        let merged = partition_and_merge(requests);

        let mut key_order: Vec<&str> = Vec::new();
        let mut expected: HashMap<&str, Vec<String>> = HashMap::new();
        for (response_id, items) in &burst {
            if !key_order.contains(&response_id.as_str()) {
                key_order.push(response_id.as_str());
            }
            expected.entry(response_id.as_str()).or_default().extend(items.iter().cloned());
        }

        prop_assert_eq!(merged.len(), key_order.len());
        for (request, response_id) in merged.iter().zip(&key_order) {
            prop_assert_eq!(request.payload.data.response_id(), Some(*response_id));
            prop_assert_eq!(&uids(request), &expected[response_id]);
        }
    }
}
