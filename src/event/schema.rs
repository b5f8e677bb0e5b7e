// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Event payload data.
//!
//! Only the fields the beacon itself reads are typed; everything else a
//! host sends rides along in `extra` and is serialized back untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable product identifier: first non-empty of child uid, child sku,
/// uid, sku (trimmed).
pub trait ProductIdentity {
    fn uid(&self) -> &str;
    fn child_uid(&self) -> Option<&str>;
    fn sku(&self) -> Option<&str>;
    fn child_sku(&self) -> Option<&str>;

    fn product_id(&self) -> String {
        [self.child_uid(), self.child_sku(), Some(self.uid()), self.sku()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|id| !id.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

macro_rules! product_identity {
    ($ty:ty) => {
        impl ProductIdentity for $ty {
            fn uid(&self) -> &str {
                &self.uid
            }
            fn child_uid(&self) -> Option<&str> {
                self.child_uid.as_deref()
            }
            fn sku(&self) -> Option<&str> {
                self.sku.as_deref()
            }
            fn child_sku(&self) -> Option<&str> {
                self.child_sku.as_deref()
            }
        }
    };
}

/// A rendered result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_sku: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }
}

product_identity!(Item);

/// A product with quantity and price (cart, order, add-to-cart).
///
/// Two products are the same cart line when `uid`, `child_uid`, `sku` and
/// `child_sku` all match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    #[serde(default)]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_sku: Option<String>,
    #[serde(default = "default_qty")]
    pub qty: u32,
    #[serde(default)]
    pub price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_qty() -> u32 {
    1
}

impl CartProduct {
    pub fn new(uid: impl Into<String>, qty: u32, price: f64) -> Self {
        Self {
            uid: uid.into(),
            qty,
            price,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child_uid: impl Into<String>, child_sku: impl Into<String>) -> Self {
        self.child_uid = Some(child_uid.into());
        self.child_sku = Some(child_sku.into());
        self
    }

    /// Same cart line as `other`.
    #[must_use]
    pub fn same_line(&self, other: &Self) -> bool {
        self.uid == other.uid
            && self.child_uid == other.child_uid
            && self.sku == other.sku
            && self.child_sku == other.child_sku
    }
}

product_identity!(CartProduct);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    #[serde(default)]
    pub uid: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_results: u64,
    pub page: u32,
    pub results_per_page: u32,
}

/// Search, autocomplete and category result renders and interactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSchemaData {
    /// Identifies one backend response being progressively rendered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub results: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banners: Option<Vec<Banner>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchSchemaData {
    pub fn new(results: Vec<Item>) -> Self {
        Self {
            results,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_response_id(mut self, response_id: impl Into<String>) -> Self {
        self.response_id = Some(response_id.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    #[must_use]
    pub fn with_banners(mut self, banners: Vec<Banner>) -> Self {
        self.banners = Some(banners);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsSchemaData {
    #[serde(default)]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(default)]
    pub results: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banners: Option<Vec<Banner>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecommendationsSchemaData {
    pub fn new(tag: impl Into<String>, results: Vec<Item>) -> Self {
        Self {
            tag: tag.into(),
            results,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_response_id(mut self, response_id: impl Into<String>) -> Self {
        self.response_id = Some(response_id.into());
        self
    }
}

/// Add-to-cart from a results surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddtocartSchemaData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub results: Vec<CartProduct>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AddtocartSchemaData {
    pub fn new(results: Vec<CartProduct>) -> Self {
        Self {
            results,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectSchemaData {
    pub redirect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RedirectSchemaData {
    pub fn new(redirect: impl Into<String>) -> Self {
        Self {
            redirect: redirect.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPageviewSchemaData {
    pub result: Item,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductPageviewSchemaData {
    pub fn new(result: Item) -> Self {
        Self {
            result,
            extra: Map::new(),
        }
    }
}

/// Cart add/remove/view. `cart`, when supplied, is the full cart after the
/// change and replaces the locally mirrored one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSchemaData {
    #[serde(default)]
    pub results: Vec<CartProduct>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart: Option<Vec<CartProduct>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CartSchemaData {
    pub fn new(results: Vec<CartProduct>) -> Self {
        Self {
            results,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_cart(mut self, cart: Vec<CartProduct>) -> Self {
        self.cart = Some(cart);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTransactionSchemaData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default)]
    pub results: Vec<CartProduct>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopperLoginData {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogData {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
