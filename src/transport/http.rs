// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use super::traits::{OutboundRequest, Transport, TransportError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(8)
            .build()?;
        Ok(Self { client })
    }

    /// Reuse an existing client (shared pools, custom TLS).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    /// `keepalive` only matters to browser hosts; a native client keeps
    /// sending regardless of page lifetime.
    async fn send(&self, request: OutboundRequest) -> Result<(), TransportError> {
        let kind = request.kind;
        let response = self
            .client
            .request(request.method, &request.url)
            .header(CONTENT_TYPE, request.content_type)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        debug!(request = %kind, status = status.as_u16(), "Beacon request sent");
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
