// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cart and viewed accessors bound to a beacon.
//!
//! Mutations go through the state stores and schedule a preflight only
//! when the stored content actually changed.

use crate::event::CartProduct;

use super::Beacon;

pub struct CartHandle<'a> {
    beacon: &'a Beacon,
}

impl<'a> CartHandle<'a> {
    pub(super) fn new(beacon: &'a Beacon) -> Self {
        Self { beacon }
    }

    #[must_use]
    pub fn get(&self) -> Vec<CartProduct> {
        self.beacon.inner.cart.get()
    }

    #[must_use]
    pub fn product_ids(&self) -> Vec<String> {
        self.beacon.inner.cart.product_ids()
    }

    pub fn set(&self, products: Vec<CartProduct>) -> bool {
        self.changed(self.beacon.inner.cart.set(products))
    }

    pub fn add(&self, products: Vec<CartProduct>) -> bool {
        self.changed(self.beacon.inner.cart.add(products))
    }

    pub fn remove(&self, products: Vec<CartProduct>) -> bool {
        self.changed(self.beacon.inner.cart.remove(products))
    }

    pub fn clear(&self) -> bool {
        self.changed(self.beacon.inner.cart.clear())
    }

    fn changed(&self, changed: bool) -> bool {
        if changed {
            self.beacon.inner.schedule_preflight();
        }
        changed
    }
}

pub struct ViewedHandle<'a> {
    beacon: &'a Beacon,
}

impl<'a> ViewedHandle<'a> {
    pub(super) fn new(beacon: &'a Beacon) -> Self {
        Self { beacon }
    }

    #[must_use]
    pub fn get(&self) -> Vec<String> {
        self.beacon.inner.viewed.get()
    }

    pub fn add<I, S>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let changed = self.beacon.inner.viewed.add(ids);
        if changed {
            self.beacon.inner.schedule_preflight();
        }
        changed
    }
}
