// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Batch keys and the partition/merge step.
//!
//! ```text
//!   drained pool ──► batchable? ──no──► passes through unchanged
//!                        │ yes
//!                        ▼
//!                 key seen before? ──no──► becomes canonical for key
//!                        │ yes
//!                        ▼
//!                 append results/banners onto canonical
//! ```
//!
//! Output order follows the first arrival of each key (or each
//! pass-through request).

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::event::{Discriminator, PayloadRequest};

/// Signature deciding which requests merge into one outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchKey(String);

impl BatchKey {
    /// `siteId||endpoint||pageLoadId||sessionId`, then the endpoint's
    /// discriminators when present. Missing discriminators degrade to the
    /// base key.
    pub fn for_request(request: &PayloadRequest) -> Self {
        let context = &request.payload.context;
        let mut key = format!(
            "{}||{}||{}||{}",
            request.site_id,
            request.endpoint.name(),
            context.page_load_id,
            context.session_id
        );

        let data = &request.payload.data;
        match request.endpoint.discriminator() {
            Discriminator::None => {}
            Discriminator::ResponseId => push_part(&mut key, "responseId", data.response_id()),
            Discriminator::ResponseIdAndTag => {
                push_part(&mut key, "responseId", data.response_id());
                push_part(&mut key, "tag", data.tag());
            }
        }
        Self(key)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn push_part(key: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        key.push_str("||");
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Group batchable requests by key and merge each group into its first
/// request. Non-batchable requests pass through untouched.
pub fn partition_and_merge(requests: Vec<PayloadRequest>) -> Vec<PayloadRequest> {
    let mut outbound: Vec<PayloadRequest> = Vec::with_capacity(requests.len());
    let mut slots: HashMap<BatchKey, usize> = HashMap::new();

    for request in requests {
        if !request.endpoint.is_batchable() {
            outbound.push(request);
            continue;
        }

        let key = BatchKey::for_request(&request);
        match slots.get(&key) {
            Some(&slot) => {
                debug!(key = %key, "Merging into batch");
                outbound[slot].payload.data.append(request.payload.data);
            }
            None => {
                slots.insert(key, outbound.len());
                outbound.push(request);
            }
        }
    }
    outbound
}
