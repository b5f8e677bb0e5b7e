// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Locally mirrored cart.
//!
//! The structured store holds full products; the cookie mirror holds only
//! comma-joined product ids for the server and for older integrations.
//! Reads try each strategy in [`READ_STRATEGIES`] order.

use std::sync::Arc;

use tracing::debug;

use crate::event::{CartProduct, ProductIdentity};
use crate::storage::facade::PersistentStore;

pub const CART_KEY: &str = "ssCart";

type ReadStrategy = fn(&PersistentStore) -> Option<Vec<CartProduct>>;

const READ_STRATEGIES: [ReadStrategy; 2] = [read_structured, read_legacy_cookie];

fn read_structured(store: &PersistentStore) -> Option<Vec<CartProduct>> {
    store
        .read_stored::<Vec<CartProduct>>(CART_KEY)
        .map(|stored| stored.value.into_iter().filter(|p| p.qty > 0).collect())
}

/// Pre-structured sessions kept only ids; rebuild placeholders.
fn read_legacy_cookie(store: &PersistentStore) -> Option<Vec<CartProduct>> {
    let raw = store.cookie(CART_KEY)?;
    let products: Vec<CartProduct> = raw
        .split(',')
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
        .map(|uid| CartProduct::new(uid, 1, 0.0))
        .collect();
    (!products.is_empty()).then_some(products)
}

pub struct CartStore {
    store: Arc<PersistentStore>,
}

impl CartStore {
    pub fn new(store: Arc<PersistentStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn get(&self) -> Vec<CartProduct> {
        READ_STRATEGIES
            .iter()
            .find_map(|strategy| strategy(&self.store))
            .unwrap_or_default()
    }

    /// Product ids in cart order, as mirrored to the cookie.
    #[must_use]
    pub fn product_ids(&self) -> Vec<String> {
        ids(&self.get())
    }

    /// Replace the cart. Returns whether the stored content changed.
    pub fn set(&self, products: Vec<CartProduct>) -> bool {
        let products: Vec<CartProduct> = products.into_iter().filter(|p| p.qty > 0).collect();
        let before = self.fingerprint(&self.get());
        let after = self.fingerprint(&products);

        if products.is_empty() {
            self.store.expire_cookie(CART_KEY);
        } else {
            self.store.set_cookie(CART_KEY, &ids(&products).join(","), None);
        }
        self.store.write_stored(CART_KEY, &products, None);

        let changed = before != after;
        debug!(items = products.len(), changed, "Cart updated");
        changed
    }

    /// What the backends can actually hold. Without the structured store
    /// only the id mirror survives, so quantities and prices never compare.
    fn fingerprint(&self, products: &[CartProduct]) -> String {
        if self.store.capabilities().storage {
            serde_json::to_string(products).unwrap_or_default()
        } else {
            ids(products).join(",")
        }
    }

    /// Merge `incoming` into the cart. A product already present (same
    /// identity tuple) gains the incoming quantity and takes its other
    /// fields; new products are prepended, last-added first.
    pub fn add(&self, incoming: Vec<CartProduct>) -> bool {
        let mut cart = self.get();
        for product in incoming.into_iter().rev() {
            if product.qty == 0 {
                continue;
            }
            match cart.iter_mut().find(|existing| existing.same_line(&product)) {
                Some(existing) => {
                    let qty = existing.qty.saturating_add(product.qty);
                    *existing = CartProduct { qty, ..product };
                }
                None => cart.insert(0, product),
            }
        }
        self.set(cart)
    }

    /// Subtract `incoming` quantities; lines reaching zero are dropped.
    pub fn remove(&self, incoming: Vec<CartProduct>) -> bool {
        let mut cart = self.get();
        for product in &incoming {
            let qty = product.qty.max(1);
            if let Some(existing) = cart.iter_mut().find(|existing| existing.same_line(product)) {
                existing.qty = existing.qty.saturating_sub(qty);
            }
        }
        self.set(cart)
    }

    pub fn clear(&self) -> bool {
        self.set(Vec::new())
    }
}

fn ids(products: &[CartProduct]) -> Vec<String> {
    products
        .iter()
        .map(ProductIdentity::product_id)
        .filter(|id| !id.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::state::tests::Harness;
    use crate::storage::cookie::CookiePolicy;
    use crate::storage::memory::{MemoryCookieStore, MemoryLocalStore};
    use crate::storage::traits::{CookieStore, LocalStore};

    #[test]
    fn test_add_merges_same_identity() {
        let h = Harness::new();
        let cart = h.cart();

        assert!(cart.add(vec![CartProduct::new("p1", 1, 10.0)]));
        assert!(cart.add(vec![CartProduct::new("p1", 2, 12.0)]));

        assert_eq!(cart.get(), vec![CartProduct::new("p1", 3, 12.0)]);
    }

    #[test]
    fn test_add_prepends_new_products_last_first() {
        let h = Harness::new();
        let cart = h.cart();

        cart.add(vec![CartProduct::new("p1", 1, 1.0)]);
        cart.add(vec![CartProduct::new("p2", 1, 2.0), CartProduct::new("p3", 1, 3.0)]);

        assert_eq!(cart.product_ids(), vec!["p2", "p3", "p1"]);
    }

    #[test]
    fn test_identity_tuple_distinguishes_variants() {
        let h = Harness::new();
        let cart = h.cart();

        cart.add(vec![CartProduct::new("p1", 1, 1.0).with_sku("red")]);
        cart.add(vec![CartProduct::new("p1", 1, 1.0).with_sku("blue")]);
        assert_eq!(cart.get().len(), 2);
    }

    #[test]
    fn test_remove_decrements_and_drops() {
        let h = Harness::new();
        let cart = h.cart();
        cart.add(vec![CartProduct::new("p1", 3, 5.0), CartProduct::new("p2", 1, 5.0)]);

        cart.remove(vec![CartProduct::new("p1", 2, 0.0)]);
        let products = cart.get();
        assert_eq!(products.iter().find(|p| p.uid == "p1").map(|p| p.qty), Some(1));

        cart.remove(vec![CartProduct::new("p1", 5, 0.0)]);
        assert_eq!(cart.product_ids(), vec!["p2"]);

        // Default quantity of one
        cart.remove(vec![CartProduct::new("p2", 0, 0.0)]);
        assert!(cart.get().is_empty());
    }

    #[test]
    fn test_remove_unknown_product_is_noop() {
        let h = Harness::new();
        let cart = h.cart();
        cart.add(vec![CartProduct::new("p1", 1, 5.0)]);
        assert!(!cart.remove(vec![CartProduct::new("nope", 1, 0.0)]));
        assert_eq!(cart.get().len(), 1);
    }

    #[test]
    fn test_set_reports_change() {
        let h = Harness::new();
        let cart = h.cart();
        let products = vec![CartProduct::new("p1", 1, 5.0)];

        assert!(cart.set(products.clone()));
        assert!(!cart.set(products));
        assert!(cart.set(vec![]));
        assert!(!cart.set(vec![]));
    }

    #[test]
    fn test_set_without_structured_store_compares_ids() {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(PersistentStore::new(
            Some(Arc::new(MemoryCookieStore::with_clock(clock.clone()))),
            Some(Arc::new(MemoryLocalStore::unavailable())),
            CookiePolicy::for_page("https://www.example.com/"),
            clock,
        ));
        let cart = CartStore::new(store);
        let products = vec![
            CartProduct::new("p1", 2, 5.0).with_child("p1-child", "p1-sku"),
            CartProduct::new("p2", 3, 1.5),
        ];

        assert!(cart.set(products.clone()));
        assert!(!cart.set(products));
        assert_eq!(cart.product_ids(), vec!["p1-child", "p2"]);
        assert!(cart.add(vec![CartProduct::new("p3", 1, 1.0)]));
        assert!(cart.remove(vec![CartProduct::new("p3", 1, 1.0)]));
        assert!(!cart.remove(vec![CartProduct::new("p9", 1, 1.0)]));
    }

    #[test]
    fn test_clear_empties_both_backends() {
        let h = Harness::new();
        let cart = h.cart();
        cart.add(vec![CartProduct::new("p1", 1, 5.0)]);
        assert_eq!(h.cookies.get(CART_KEY).unwrap().as_deref(), Some("p1"));

        assert!(cart.clear());
        assert!(cart.get().is_empty());
        assert!(h.cookies.get(CART_KEY).unwrap().is_none());

        let raw: serde_json::Value =
            serde_json::from_str(&h.local.get_item(CART_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(raw["value"], serde_json::json!([]));
    }

    #[test]
    fn test_cookie_mirror_uses_product_ids() {
        let h = Harness::new();
        let cart = h.cart();
        cart.add(vec![
            CartProduct::new("p1", 1, 5.0).with_child("p1-child", "p1-sku"),
            CartProduct::new("p2", 1, 5.0),
        ]);
        assert_eq!(h.cookies.get(CART_KEY).unwrap().as_deref(), Some("p1-child,p2"));
    }

    #[test]
    fn test_legacy_cookie_fallback() {
        let h = Harness::new();
        let cart = h.cart();
        h.store.set_cookie(CART_KEY, "a, b,,c", None);

        let products = cart.get();
        assert_eq!(
            products,
            vec![
                CartProduct::new("a", 1, 0.0),
                CartProduct::new("b", 1, 0.0),
                CartProduct::new("c", 1, 0.0),
            ]
        );
    }

    #[test]
    fn test_corrupt_structured_entry_falls_back() {
        let h = Harness::new();
        let cart = h.cart();
        h.local.set_item(CART_KEY, "{broken").unwrap();
        assert!(cart.get().is_empty());
        assert!(h.local.get_item(CART_KEY).unwrap().is_none());
    }
}
