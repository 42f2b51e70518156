//! Favicon Resolver
//!
//! Picks one display icon per card. Precedence, first match wins:
//! 1. inline `favicon` starting with `http` -> icon proxy
//! 2. inline non-http `favicon` (data URI, path) -> verbatim
//! 3. `favicon_id` found in the favicon table -> proxy if http, else verbatim
//! 4. browser-internal page (`chrome://` ...) -> none
//! 5. favicon-by-domain service for the card's host, empty string if the URL
//!    does not parse

use std::collections::HashMap;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::config::{SyncConfig, DEFAULT_FAVICON_SERVICE_BASE, DEFAULT_ICON_PROXY_BASE};
use crate::domain::{index_by_id, Card, Favicon, RecordId, SyncData};

const INTERNAL_SCHEMES: [&str; 9] = [
    "chrome://",
    "chrome-extension://",
    "edge://",
    "about:",
    "brave://",
    "opera://",
    "vivaldi://",
    "moz-extension://",
    "view-source:",
];

fn is_http(value: &str) -> bool {
    value.starts_with("http")
}

fn is_internal_page(url: &str) -> bool {
    let url = url.trim_start().to_ascii_lowercase();
    INTERNAL_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
}

/// External icon services used by the resolver
#[derive(Debug, Clone, PartialEq)]
pub struct FaviconServices {
    proxy_base: String,
    fallback_base: String,
}

impl Default for FaviconServices {
    fn default() -> Self {
        Self::new(DEFAULT_ICON_PROXY_BASE, DEFAULT_FAVICON_SERVICE_BASE)
    }
}

impl FaviconServices {
    pub fn new(proxy_base: &str, fallback_base: &str) -> Self {
        Self {
            proxy_base: proxy_base.to_string(),
            fallback_base: fallback_base.to_string(),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(&config.icon_proxy_base, &config.favicon_service_base)
    }

    /// Route an absolute icon URL through the caching/normalizing image proxy
    pub fn proxied(&self, url: &str) -> String {
        format!(
            "{}?url={}&w=64&h=64&fit=contain&output=png",
            self.proxy_base,
            utf8_percent_encode(url, NON_ALPHANUMERIC)
        )
    }

    /// 32px icon for a hostname
    pub fn by_domain(&self, host: &str) -> String {
        format!(
            "{}?domain={}&sz=32",
            self.fallback_base,
            utf8_percent_encode(host, NON_ALPHANUMERIC)
        )
    }

    fn from_value(&self, value: &str) -> String {
        if is_http(value) {
            self.proxied(value)
        } else {
            value.to_string()
        }
    }

    /// Resolve the display icon of one card. Never fails; `Some("")` means
    /// "render a placeholder".
    pub fn resolve(&self, card: &Card, table: &HashMap<RecordId, &Favicon>) -> Option<String> {
        if let Some(inline) = card.favicon.as_deref().filter(|f| !f.is_empty()) {
            return Some(self.from_value(inline));
        }

        if let Some(entry) = card.favicon_id.and_then(|id| table.get(&id)) {
            return Some(self.from_value(&entry.url));
        }

        if is_internal_page(&card.url) {
            return None;
        }

        let host = reqwest::Url::parse(card.url.trim())
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()));
        Some(match host {
            Some(host) if !host.is_empty() => self.by_domain(&host),
            _ => String::new(),
        })
    }

    /// Write the resolved icon onto every card of a freshly fetched snapshot
    pub fn enrich(&self, data: &mut SyncData) {
        let resolved: Vec<Option<String>> = {
            let table = index_by_id(&data.favicons);
            data.cards.iter().map(|card| self.resolve(card, &table)).collect()
        };
        for (card, favicon) in data.cards.iter_mut().zip(resolved) {
            card.favicon = favicon;
        }
    }
}
