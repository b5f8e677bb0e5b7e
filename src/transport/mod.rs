// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

pub mod http;
pub mod memory;
pub mod traits;

pub use http::HttpTransport;
pub use memory::RecordingTransport;
pub use traits::{
    OutboundRequest, RequestKind, Transport, TransportError, CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT,
};
