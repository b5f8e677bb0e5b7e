// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Preflight cache warming.
//!
//! A preflight tells the personalization service who the shopper is and what
//! they have in their cart and recently viewed, so the next recommendation
//! request is served warm. Only identifiers travel, never full products.

use reqwest::Method;
use serde::Serialize;

use crate::transport::{OutboundRequest, RequestKind, CONTENT_TYPE_JSON};

pub const PREFLIGHT_PATH: &str = "/api/personalization/preflightCache";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightRequest {
    pub user_id: String,
    pub site_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_viewed: Option<Vec<String>>,
}

impl PreflightRequest {
    /// Empty shopper/cart/viewed values are left out of the body.
    pub fn new(
        user_id: impl Into<String>,
        site_id: impl Into<String>,
        shopper: &str,
        cart: Vec<String>,
        last_viewed: Vec<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            site_id: site_id.into(),
            shopper: (!shopper.is_empty()).then(|| shopper.to_string()),
            cart: (!cart.is_empty()).then_some(cart),
            last_viewed: (!last_viewed.is_empty()).then_some(last_viewed),
        }
    }

    /// Nothing to warm without a user, a site, and at least one of
    /// shopper, cart or viewed.
    #[must_use]
    pub fn is_worth_sending(&self) -> bool {
        !self.user_id.is_empty()
            && !self.site_id.is_empty()
            && (self.shopper.is_some() || self.cart.is_some() || self.last_viewed.is_some())
    }

    pub fn to_outbound(&self, origin: &str) -> Result<OutboundRequest, serde_json::Error> {
        Ok(OutboundRequest {
            kind: RequestKind::Preflight,
            url: format!("{}{}", origin.trim_end_matches('/'), PREFLIGHT_PATH),
            method: Method::POST,
            content_type: CONTENT_TYPE_JSON,
            body: serde_json::to_string(self)?,
            keepalive: false,
        })
    }
}
