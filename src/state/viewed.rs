// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Recently viewed product ids, most recent first.

use std::sync::Arc;

use tracing::debug;

use crate::context::MAX_EXPIRATION;
use crate::storage::facade::PersistentStore;

pub const VIEWED_KEY: &str = "ssViewed";
pub const MAX_VIEWED_COUNT: usize = 20;

type ReadStrategy = fn(&PersistentStore) -> Option<Vec<String>>;

const READ_STRATEGIES: [ReadStrategy; 2] = [read_structured, read_cookie];

fn read_structured(store: &PersistentStore) -> Option<Vec<String>> {
    store
        .read_stored::<Vec<String>>(VIEWED_KEY)
        .map(|stored| stored.value)
}

fn read_cookie(store: &PersistentStore) -> Option<Vec<String>> {
    let raw = store.cookie(VIEWED_KEY)?;
    let ids: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    (!ids.is_empty()).then_some(ids)
}

pub struct ViewedStore {
    store: Arc<PersistentStore>,
}

impl ViewedStore {
    pub fn new(store: Arc<PersistentStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn get(&self) -> Vec<String> {
        READ_STRATEGIES
            .iter()
            .find_map(|strategy| strategy(&self.store))
            .unwrap_or_default()
    }

    /// Move each id to the front (inserting if new), then cap the list.
    /// Returns whether the stored content changed.
    pub fn add<I, S>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.get();
        let mut viewed = before.clone();
        for id in ids {
            let id = id.as_ref().trim();
            if id.is_empty() {
                continue;
            }
            viewed.retain(|existing| existing != id);
            viewed.insert(0, id.to_string());
        }
        viewed.truncate(MAX_VIEWED_COUNT);

        let ttl = chrono::Duration::from_std(MAX_EXPIRATION).ok();
        self.store.set_cookie(VIEWED_KEY, &viewed.join(","), ttl);
        self.store.write_stored(VIEWED_KEY, &viewed, None);

        let changed = viewed != before;
        debug!(items = viewed.len(), changed, "Viewed list updated");
        changed
    }
}
