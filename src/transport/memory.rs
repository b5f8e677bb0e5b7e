// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Recording transport for tests and host-side debugging.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::traits::{OutboundRequest, RequestKind, Transport, TransportError};
use crate::event::Endpoint;

/// Keeps every request it is handed. When set failing it still records the
/// attempt, then rejects it.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<OutboundRequest>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that rejects every request.
    #[must_use]
    pub fn failing() -> Self {
        let transport = Self::new();
        transport.set_failing(true);
        transport
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().clone()
    }

    /// Requests for one event endpoint.
    #[must_use]
    pub fn for_endpoint(&self, endpoint: Endpoint) -> Vec<OutboundRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.kind == RequestKind::Event(endpoint))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn preflights(&self) -> Vec<OutboundRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.kind == RequestKind::Preflight)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }

    pub fn clear(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: OutboundRequest) -> Result<(), TransportError> {
        self.requests.lock().push(request);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable("recording transport set to fail".into()));
        }
        Ok(())
    }
}
