// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Dispatch, batch flushing, preflight and storage fault reporting.
//!
//! Nothing here awaits on the caller's path: every send is spawned onto
//! the runtime captured at construction, and locks are released before any
//! task is spawned.

use std::sync::{Arc, Weak};

use reqwest::Method;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::batching::partition_and_merge;
use crate::event::{Endpoint, ErrorLogData, EventData, EventPayload, PayloadRequest};
use crate::metrics;
use crate::preflight::PreflightRequest;
use crate::storage::facade::StorageFault;
use crate::transport::{OutboundRequest, RequestKind, CONTENT_TYPE_TEXT};

use super::Inner;

pub(super) const STORAGE_QUOTA_MESSAGE: &str = "storage quota exceeded";

impl Inner {
    /// Queue a batchable request and restart the batching window.
    pub(super) fn enqueue(self: &Arc<Self>, request: PayloadRequest) {
        let depth = self.pool.lock().push(request);
        metrics::set_pending_requests(depth);

        let inner = Arc::downgrade(self);
        self.batch_timer.trigger(move || {
            if let Some(inner) = inner.upgrade() {
                inner.flush();
            }
        });
    }

    /// Drain the pool, merge by batch key and dispatch the result.
    pub(super) fn flush(&self) {
        let pending = self.pool.lock().take();
        metrics::set_pending_requests(0);
        if pending.is_empty() {
            return;
        }

        let count = pending.len();
        let outbound = partition_and_merge(pending);
        metrics::record_flush(count, outbound.len());
        debug!(pending = count, outbound = outbound.len(), "Batching window closed");

        for request in outbound {
            self.dispatch(request);
        }
    }

    pub(super) fn event_url(&self, request: &PayloadRequest) -> String {
        format!(
            "{}/beacon/v2/{}/{}/{}",
            self.config.beacon_origin.trim_end_matches('/'),
            request.site_id,
            request.api_type(),
            request.endpoint.action()
        )
    }

    /// Serialize and hand one event to the transport.
    pub(super) fn dispatch(&self, request: PayloadRequest) {
        let body = match request.body() {
            Ok(body) => body,
            Err(e) => {
                warn!(endpoint = %request.endpoint, error = %e, "Failed to serialize event");
                return;
            }
        };
        self.send(OutboundRequest {
            kind: RequestKind::Event(request.endpoint),
            url: self.event_url(&request),
            method: Method::POST,
            content_type: CONTENT_TYPE_TEXT,
            body,
            keepalive: !self.config.is_development(),
        });
    }

    /// Fire and forget. Failures are counted, logged in development, and
    /// otherwise dropped.
    pub(super) fn send(&self, request: OutboundRequest) {
        let transport = self.transport.clone();
        let development = self.config.is_development();
        self.runtime.spawn(async move {
            let kind = request.kind;
            match transport.send(request).await {
                Ok(()) => metrics::record_dispatch(kind.api(), kind.name()),
                Err(e) => {
                    metrics::record_transport_error(kind.api(), kind.name());
                    if development {
                        warn!(request = %kind, error = %e, "Beacon request failed");
                    }
                }
            }
        });
    }

    /// Restart the preflight debounce.
    pub(super) fn schedule_preflight(self: &Arc<Self>) {
        let inner = Arc::downgrade(self);
        self.preflight_timer.trigger(move || {
            if let Some(inner) = inner.upgrade() {
                inner.send_preflight();
            }
        });
    }

    /// Build the preflight from the state as it is now.
    pub(super) fn send_preflight(&self) {
        let request = PreflightRequest::new(
            self.context.user_id(),
            self.globals.site_id.clone(),
            &self.context.shopper_id(),
            self.cart.product_ids(),
            self.viewed.get(),
        );
        let worth_sending = request.is_worth_sending();
        metrics::record_preflight(worth_sending);
        if !worth_sending {
            debug!("Nothing to preflight");
            return;
        }

        let origin = self.config.personalization_origin(&self.globals.site_id);
        match request.to_outbound(&origin) {
            Ok(outbound) => self.send(outbound),
            Err(e) => warn!(error = %e, "Failed to serialize preflight"),
        }
    }

    pub(super) fn spawn_fault_reporter(self: &Arc<Self>, faults: UnboundedReceiver<StorageFault>) {
        self.runtime.spawn(report_storage_faults(Arc::downgrade(self), faults));
    }

    /// Quota faults become `logSnap` error events. The context is a
    /// snapshot so reporting never writes to storage again.
    pub(super) fn report_storage_fault(&self, fault: StorageFault) {
        let data = ErrorLogData {
            message: STORAGE_QUOTA_MESSAGE.to_string(),
            stack: None,
            details: Some(json!({
                "kind": "storage-quota",
                "key": fault.key,
                "value": fault.value,
            })),
        };
        let request = PayloadRequest::new(
            Endpoint::LogSnap,
            self.globals.site_id.clone(),
            EventPayload {
                context: self.context.snapshot(),
                data: EventData::Log(data),
            },
        );
        metrics::record_event(request.api_type().as_str(), request.endpoint.name(), false);
        self.dispatch(request);
    }
}

async fn report_storage_faults(inner: Weak<Inner>, mut faults: UnboundedReceiver<StorageFault>) {
    // Ends when the store (and its sender) is dropped with the beacon
    while let Some(fault) = faults.recv().await {
        let Some(inner) = inner.upgrade() else { break };
        inner.report_storage_fault(fault);
    }
}
