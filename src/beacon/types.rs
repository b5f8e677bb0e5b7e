//! Public types for the beacon.

use std::sync::Arc;

use thiserror::Error;

use crate::clock::Clock;
use crate::storage::traits::{CookieStore, LocalStore};
use crate::transport::Transport;

/// Construction failures. Nothing after construction returns an error.
#[derive(Error, Debug)]
pub enum BeaconError {
    #[error("siteId is required and must be a non-empty string")]
    InvalidSiteId,

    #[error("Invalid globals: {0}")]
    InvalidGlobals(#[from] serde_json::Error),

    #[error("Beacon must be constructed inside a tokio runtime")]
    NoRuntime,
}

/// Host capabilities the beacon runs on.
///
/// Either store may be absent; with neither, identity and state only last
/// for the lifetime of the instance.
pub struct Backends {
    pub cookies: Option<Arc<dyn CookieStore>>,
    pub local: Option<Arc<dyn LocalStore>>,
    pub transport: Arc<dyn Transport>,
    /// Defaults to the system clock
    pub clock: Option<Arc<dyn Clock>>,
}

impl Backends {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            cookies: None,
            local: None,
            transport,
            clock: None,
        }
    }

    #[must_use]
    pub fn with_cookies(mut self, cookies: Arc<dyn CookieStore>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    #[must_use]
    pub fn with_local(mut self, local: Arc<dyn LocalStore>) -> Self {
        self.local = Some(local);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}
