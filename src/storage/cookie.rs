// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cookie records and the attribute policy applied to every beacon cookie.

use chrono::{DateTime, Duration, TimeZone, Utc};
use url::{form_urlencoded, Url};

pub const COOKIE_SAMESITE: &str = "Lax";

/// A cookie write with every attribute the beacon sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub same_site: &'static str,
    pub path: &'static str,
    pub secure: bool,
    /// `None` is a session cookie
    pub expires: Option<DateTime<Utc>>,
    pub domain: Option<String>,
}

impl Cookie {
    /// True when this write removes the cookie.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }

    /// `document.cookie` assignment string.
    #[must_use]
    pub fn to_header(&self) -> String {
        let mut header = format!(
            "{}={};SameSite={};path={};",
            self.name,
            encode_value(&self.value),
            self.same_site,
            self.path
        );
        if self.secure {
            header.push_str("Secure;");
        }
        if let Some(expires) = self.expires {
            header.push_str(&format!(
                "expires={};",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
        if let Some(domain) = &self.domain {
            header.push_str(&format!("domain={};", domain));
        }
        header
    }
}

/// Attributes derived once from the page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    pub secure: bool,
    pub domain: Option<String>,
}

impl CookiePolicy {
    /// `Secure` unless the page is plain http; domain is the host with a
    /// leading `www.` stripped, prefixed with a dot.
    #[must_use]
    pub fn for_page(href: &str) -> Self {
        match Url::parse(href) {
            Ok(url) => Self {
                secure: url.scheme() != "http",
                domain: url
                    .host_str()
                    .filter(|host| !host.is_empty())
                    .map(|host| format!(".{}", host.strip_prefix("www.").unwrap_or(host))),
            },
            Err(_) => Self {
                secure: true,
                domain: None,
            },
        }
    }

    #[must_use]
    pub fn cookie(&self, name: &str, value: &str, ttl: Option<Duration>, now: DateTime<Utc>) -> Cookie {
        Cookie {
            name: name.to_string(),
            value: value.to_string(),
            same_site: COOKIE_SAMESITE,
            path: "/",
            secure: self.secure,
            expires: ttl.map(|ttl| now + ttl),
            domain: self.domain.clone(),
        }
    }

    /// Empty value with an explicitly past expiration.
    #[must_use]
    pub fn expired(&self, name: &str) -> Cookie {
        Cookie {
            name: name.to_string(),
            value: String::new(),
            same_site: COOKIE_SAMESITE,
            path: "/",
            secure: self.secure,
            expires: Utc.timestamp_opt(0, 0).single(),
            domain: self.domain.clone(),
        }
    }
}

#[must_use]
pub fn encode_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[must_use]
pub fn decode_value(raw: &str) -> String {
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(decoded, _)| decoded.into_owned())
        .unwrap_or_default()
}
