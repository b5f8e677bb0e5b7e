//! Configuration for the beacon.
//!
//! # Example
//!
//! ```
//! use beacon_engine::{BeaconConfig, Mode};
//!
//! // Minimal config (uses defaults)
//! let config = BeaconConfig::default();
//! assert_eq!(config.batch_window_ms, 150);
//! assert_eq!(config.mode, Mode::Production);
//!
//! // Full config
//! let config = BeaconConfig {
//!     mode: Mode::Development,
//!     href: Some("https://www.example.com/search?q=shoes".into()),
//!     version: Some("1.2.0".into()),
//!     ..Default::default()
//! };
//! assert_eq!(config.initiator(), "searchspring/snap/preact/1.2.0");
//! ```

use serde::Deserialize;
use std::time::Duration;

use crate::context::Currency;

/// Runtime mode. Development enables diagnostics and `dev` context stamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Production,
    Development,
}

/// Site-level globals required to construct a beacon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Globals {
    pub site_id: String,
    #[serde(default)]
    pub currency: Option<Currency>,
}

impl Globals {
    pub fn new(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            currency: None,
        }
    }

    #[must_use]
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }
}

/// Configuration for the beacon.
///
/// All fields have defaults; in a host page `href` and `user_agent` are
/// normally filled from the browser.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconConfig {
    #[serde(default)]
    pub mode: Mode,

    /// Integrating framework, part of the context initiator
    #[serde(default = "default_framework")]
    pub framework: String,

    /// Integration version, appended to the initiator when set
    #[serde(default)]
    pub version: Option<String>,

    /// Full initiator override (e.g. the CDN bundle sets its own)
    #[serde(default)]
    pub initiator: Option<String>,

    /// Current page URL
    #[serde(default)]
    pub href: Option<String>,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Sliding window for coalescing render/impression events
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: u64,

    /// Debounce window for preflight cache warming
    #[serde(default = "default_preflight_debounce_ms")]
    pub preflight_debounce_ms: u64,

    /// Event collection origin
    #[serde(default = "default_beacon_origin")]
    pub beacon_origin: String,

    /// Personalization origin; defaults to `https://<siteId>.a.searchspring.io`
    #[serde(default)]
    pub personalization_origin: Option<String>,
}

fn default_framework() -> String { "snap/preact".to_string() }
fn default_batch_window_ms() -> u64 { 150 }
fn default_preflight_debounce_ms() -> u64 { 300 }
fn default_beacon_origin() -> String { "https://beacon.searchspring.io".to_string() }

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            framework: default_framework(),
            version: None,
            initiator: None,
            href: None,
            user_agent: None,
            batch_window_ms: default_batch_window_ms(),
            preflight_debounce_ms: default_preflight_debounce_ms(),
            beacon_origin: default_beacon_origin(),
            personalization_origin: None,
        }
    }
}

impl BeaconConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.mode == Mode::Development
    }

    #[must_use]
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }

    #[must_use]
    pub fn preflight_debounce(&self) -> Duration {
        Duration::from_millis(self.preflight_debounce_ms)
    }

    /// Initiator stamped on every context.
    #[must_use]
    pub fn initiator(&self) -> String {
        if let Some(initiator) = &self.initiator {
            return initiator.clone();
        }
        match &self.version {
            Some(version) => format!("searchspring/{}/{}", self.framework, version),
            None => format!("searchspring/{}", self.framework),
        }
    }

    #[must_use]
    pub fn page_url(&self) -> &str {
        self.href.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn personalization_origin(&self, site_id: &str) -> String {
        self.personalization_origin
            .clone()
            .unwrap_or_else(|| format!("https://{}.a.searchspring.io", site_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BeaconConfig::default();
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.framework, "snap/preact");
        assert_eq!(config.batch_window(), Duration::from_millis(150));
        assert_eq!(config.preflight_debounce(), Duration::from_millis(300));
        assert_eq!(config.page_url(), "");
        assert!(!config.is_development());
    }

    #[test]
    fn test_initiator_variants() {
        let mut config = BeaconConfig::default();
        assert_eq!(config.initiator(), "searchspring/snap/preact");

        config.version = Some("0.4.1".into());
        assert_eq!(config.initiator(), "searchspring/snap/preact/0.4.1");

        config.initiator = Some("athos/cdn/beaconjs/2.0.0".into());
        assert_eq!(config.initiator(), "athos/cdn/beaconjs/2.0.0");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: BeaconConfig = serde_json::from_str(
            r#"{"mode": "development", "batchWindowMs": 50, "href": "https://shop.test/"}"#,
        )
        .unwrap();
        assert!(config.is_development());
        assert_eq!(config.batch_window_ms, 50);
        assert_eq!(config.preflight_debounce_ms, 300);
        assert_eq!(config.page_url(), "https://shop.test/");
    }

    #[test]
    fn test_personalization_origin() {
        let config = BeaconConfig::default();
        assert_eq!(config.personalization_origin("abc123"), "https://abc123.a.searchspring.io");

        let config = BeaconConfig {
            personalization_origin: Some("http://localhost:8080".into()),
            ..Default::default()
        };
        assert_eq!(config.personalization_origin("abc123"), "http://localhost:8080");
    }

    #[test]
    fn test_globals_reject_non_string_site_id() {
        let parsed: Result<Globals, _> = serde_json::from_str(r#"{"siteId": 42}"#);
        assert!(parsed.is_err());

        let globals: Globals = serde_json::from_str(r#"{"siteId": "abc123", "currency": {"code": "EUR"}}"#).unwrap();
        assert_eq!(globals.site_id, "abc123");
        assert_eq!(globals.currency.unwrap().code, "EUR");
    }
}
