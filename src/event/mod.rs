// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Event model.
//!
//! Every public event call resolves to one [`Endpoint`] variant. The variant
//! fixes the API surface (`apiType`), the wire name (`searchRender`, ...),
//! whether the event is batchable, and which discriminators enter its batch
//! key. Payload data is carried as a typed [`EventData`].

pub mod schema;

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::context::Context;
pub use schema::*;

/// API surface an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiType {
    Shopper,
    Autocomplete,
    Search,
    Category,
    Recommendations,
    Product,
    Cart,
    Order,
    Error,
}

impl ApiType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ApiType::Shopper => "shopper",
            ApiType::Autocomplete => "autocomplete",
            ApiType::Search => "search",
            ApiType::Category => "category",
            ApiType::Recommendations => "recommendations",
            ApiType::Product => "product",
            ApiType::Cart => "cart",
            ApiType::Order => "order",
            ApiType::Error => "error",
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which endpoint-specific fields enter the batch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discriminator {
    /// Not batchable
    None,
    ResponseId,
    ResponseIdAndTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,

    AutocompleteRender,
    AutocompleteImpression,
    AutocompleteClickthrough,
    AutocompleteAddtocart,
    AutocompleteRedirect,

    SearchRender,
    SearchImpression,
    SearchClickthrough,
    SearchAddtocart,
    SearchRedirect,

    CategoryRender,
    CategoryImpression,
    CategoryClickthrough,
    CategoryAddtocart,

    RecommendationsRender,
    RecommendationsImpression,
    RecommendationsClickthrough,
    RecommendationsAddtocart,

    ProductPageview,

    CartAdd,
    CartRemove,
    CartView,

    OrderTransaction,

    LogSnap,
    LogShopifypixel,
}

impl Endpoint {
    pub const ALL: [Endpoint; 26] = [
        Endpoint::Login,
        Endpoint::AutocompleteRender,
        Endpoint::AutocompleteImpression,
        Endpoint::AutocompleteClickthrough,
        Endpoint::AutocompleteAddtocart,
        Endpoint::AutocompleteRedirect,
        Endpoint::SearchRender,
        Endpoint::SearchImpression,
        Endpoint::SearchClickthrough,
        Endpoint::SearchAddtocart,
        Endpoint::SearchRedirect,
        Endpoint::CategoryRender,
        Endpoint::CategoryImpression,
        Endpoint::CategoryClickthrough,
        Endpoint::CategoryAddtocart,
        Endpoint::RecommendationsRender,
        Endpoint::RecommendationsImpression,
        Endpoint::RecommendationsClickthrough,
        Endpoint::RecommendationsAddtocart,
        Endpoint::ProductPageview,
        Endpoint::CartAdd,
        Endpoint::CartRemove,
        Endpoint::CartView,
        Endpoint::OrderTransaction,
        Endpoint::LogSnap,
        Endpoint::LogShopifypixel,
    ];

    /// Wire name, also the metric label.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Login => "login",
            Endpoint::AutocompleteRender => "autocompleteRender",
            Endpoint::AutocompleteImpression => "autocompleteImpression",
            Endpoint::AutocompleteClickthrough => "autocompleteClickthrough",
            Endpoint::AutocompleteAddtocart => "autocompleteAddtocart",
            Endpoint::AutocompleteRedirect => "autocompleteRedirect",
            Endpoint::SearchRender => "searchRender",
            Endpoint::SearchImpression => "searchImpression",
            Endpoint::SearchClickthrough => "searchClickthrough",
            Endpoint::SearchAddtocart => "searchAddtocart",
            Endpoint::SearchRedirect => "searchRedirect",
            Endpoint::CategoryRender => "categoryRender",
            Endpoint::CategoryImpression => "categoryImpression",
            Endpoint::CategoryClickthrough => "categoryClickthrough",
            Endpoint::CategoryAddtocart => "categoryAddtocart",
            Endpoint::RecommendationsRender => "recommendationsRender",
            Endpoint::RecommendationsImpression => "recommendationsImpression",
            Endpoint::RecommendationsClickthrough => "recommendationsClickthrough",
            Endpoint::RecommendationsAddtocart => "recommendationsAddtocart",
            Endpoint::ProductPageview => "productPageview",
            Endpoint::CartAdd => "cartAdd",
            Endpoint::CartRemove => "cartRemove",
            Endpoint::CartView => "cartView",
            Endpoint::OrderTransaction => "orderTransaction",
            Endpoint::LogSnap => "logSnap",
            Endpoint::LogShopifypixel => "logShopifypixel",
        }
    }

    #[must_use]
    pub fn api_type(self) -> ApiType {
        use Endpoint::*;
        match self {
            Login => ApiType::Shopper,
            AutocompleteRender | AutocompleteImpression | AutocompleteClickthrough
            | AutocompleteAddtocart | AutocompleteRedirect => ApiType::Autocomplete,
            SearchRender | SearchImpression | SearchClickthrough | SearchAddtocart
            | SearchRedirect => ApiType::Search,
            CategoryRender | CategoryImpression | CategoryClickthrough | CategoryAddtocart => {
                ApiType::Category
            }
            RecommendationsRender
            | RecommendationsImpression
            | RecommendationsClickthrough
            | RecommendationsAddtocart => ApiType::Recommendations,
            ProductPageview => ApiType::Product,
            CartAdd | CartRemove | CartView => ApiType::Cart,
            OrderTransaction => ApiType::Order,
            LogSnap | LogShopifypixel => ApiType::Error,
        }
    }

    /// Path segment under the api type: `searchRender` -> `render`.
    #[must_use]
    pub fn action(self) -> &'static str {
        use Endpoint::*;
        match self {
            Login => "login",
            AutocompleteRender | SearchRender | CategoryRender | RecommendationsRender => "render",
            AutocompleteImpression
            | SearchImpression
            | CategoryImpression
            | RecommendationsImpression => "impression",
            AutocompleteClickthrough
            | SearchClickthrough
            | CategoryClickthrough
            | RecommendationsClickthrough => "clickthrough",
            AutocompleteAddtocart
            | SearchAddtocart
            | CategoryAddtocart
            | RecommendationsAddtocart => "addtocart",
            AutocompleteRedirect | SearchRedirect => "redirect",
            ProductPageview => "pageview",
            CartAdd => "add",
            CartRemove => "remove",
            CartView => "view",
            OrderTransaction => "transaction",
            LogSnap => "snap",
            LogShopifypixel => "shopifypixel",
        }
    }

    #[must_use]
    pub fn discriminator(self) -> Discriminator {
        use Endpoint::*;
        match self {
            AutocompleteRender | AutocompleteImpression | SearchRender | SearchImpression
            | CategoryRender | CategoryImpression => Discriminator::ResponseId,
            RecommendationsRender | RecommendationsImpression => Discriminator::ResponseIdAndTag,
            _ => Discriminator::None,
        }
    }

    /// Render and impression events coalesce within the batching window.
    #[must_use]
    pub fn is_batchable(self) -> bool {
        self.discriminator() != Discriminator::None
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a host passes to an event method: data plus an optional per-event
/// site override.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload<T> {
    pub site_id: Option<String>,
    pub data: T,
}

impl<T> Payload<T> {
    pub fn new(data: T) -> Self {
        Self { site_id: None, data }
    }

    #[must_use]
    pub fn with_site_id(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = Some(site_id.into());
        self
    }
}

impl<T> From<T> for Payload<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

/// Typed body data, one variant per schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    /// Login carries context only
    Login,
    Search(SearchSchemaData),
    Recommendations(RecommendationsSchemaData),
    Addtocart(AddtocartSchemaData),
    Redirect(RedirectSchemaData),
    ProductPageview(ProductPageviewSchemaData),
    Cart(CartSchemaData),
    Order(OrderTransactionSchemaData),
    Log(ErrorLogData),
}

impl EventData {
    fn is_empty(&self) -> bool {
        matches!(self, EventData::Login)
    }

    #[must_use]
    pub fn response_id(&self) -> Option<&str> {
        let id = match self {
            EventData::Search(data) => data.response_id.as_deref(),
            EventData::Recommendations(data) => data.response_id.as_deref(),
            EventData::Addtocart(data) => data.response_id.as_deref(),
            EventData::Redirect(data) => data.response_id.as_deref(),
            _ => None,
        };
        id.filter(|id| !id.is_empty())
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        let tag = match self {
            EventData::Recommendations(data) => Some(data.tag.as_str()),
            EventData::Addtocart(data) => data.tag.as_deref(),
            _ => None,
        };
        tag.filter(|tag| !tag.is_empty())
    }

    /// Append `other`'s results and banners onto this payload in order.
    /// Nothing else is touched; mismatched variants are ignored.
    pub fn append(&mut self, other: EventData) {
        match (self, other) {
            (EventData::Search(into), EventData::Search(from)) => {
                into.results.extend(from.results);
                append_banners(&mut into.banners, from.banners);
            }
            (EventData::Recommendations(into), EventData::Recommendations(from)) => {
                into.results.extend(from.results);
                append_banners(&mut into.banners, from.banners);
            }
            _ => {}
        }
    }
}

fn append_banners(into: &mut Option<Vec<Banner>>, from: Option<Vec<Banner>>) {
    if let Some(from) = from {
        into.get_or_insert_with(Vec::new).extend(from);
    }
}

/// Full request body: `{ context, data }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPayload {
    pub context: Context,
    #[serde(skip_serializing_if = "EventData::is_empty")]
    pub data: EventData,
}

/// An event pending dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadRequest {
    pub id: String,
    pub endpoint: Endpoint,
    pub site_id: String,
    pub payload: EventPayload,
}

impl PayloadRequest {
    pub fn new(endpoint: Endpoint, site_id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            endpoint,
            site_id: site_id.into(),
            payload,
        }
    }

    #[must_use]
    pub fn api_type(&self) -> ApiType {
        self.endpoint.api_type()
    }

    pub fn body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.payload)
    }
}
