// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Pending request pool for one batching window.
//!
//! The pool only accumulates; the debounce timer decides when it drains.
//! Draining swaps the list out in one step so nothing queued afterwards can
//! observe a half-drained pool.

use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::event::PayloadRequest;

#[derive(Debug, Default)]
pub struct PayloadPool {
    requests: Vec<PayloadRequest>,
    opened_at: Option<Instant>,
}

impl PayloadPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append in arrival order; returns the new depth.
    pub fn push(&mut self, request: PayloadRequest) -> usize {
        if self.requests.is_empty() {
            self.opened_at = Some(Instant::now());
        }
        self.requests.push(request);
        self.requests.len()
    }

    /// Drain everything. The pool is empty afterwards regardless of what
    /// the caller does with the requests.
    pub fn take(&mut self) -> Vec<PayloadRequest> {
        let requests = std::mem::take(&mut self.requests);
        if !requests.is_empty() {
            debug!(count = requests.len(), age_ms = self.age().as_millis() as u64, "Pool drained");
        }
        self.opened_at = None;
        requests
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.requests.iter().any(|request| request.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Time since the first request of this window arrived.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.opened_at.map(|at| at.elapsed()).unwrap_or_default()
    }
}
