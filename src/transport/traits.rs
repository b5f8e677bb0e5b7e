// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::fmt;

use async_trait::async_trait;
use reqwest::Method;
use thiserror::Error;

use crate::event::Endpoint;

pub const CONTENT_TYPE_TEXT: &str = "text/plain";
pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Endpoint responded with status {status}")]
    Status { status: u16 },
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// What an outbound request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Event(Endpoint),
    Preflight,
}

impl RequestKind {
    /// API surface label, used for metrics and logs.
    #[must_use]
    pub fn api(self) -> &'static str {
        match self {
            RequestKind::Event(endpoint) => endpoint.api_type().as_str(),
            RequestKind::Preflight => "personalization",
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RequestKind::Event(endpoint) => endpoint.name(),
            RequestKind::Preflight => "preflightCache",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api(), self.name())
    }
}

/// A finalized request ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub kind: RequestKind,
    pub url: String,
    pub method: Method,
    pub content_type: &'static str,
    pub body: String,
    /// Ask the host to let the request outlive the page
    pub keepalive: bool,
}

impl OutboundRequest {
    #[must_use]
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self.kind {
            RequestKind::Event(endpoint) => Some(endpoint),
            RequestKind::Preflight => None,
        }
    }

    /// Body parsed as JSON, for inspection.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Delivers outbound requests. The beacon never awaits the result on the
/// caller's path and never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<(), TransportError>;
}
