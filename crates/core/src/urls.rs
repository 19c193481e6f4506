// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! URL list parsing.

use std::collections::HashSet;
use url::Url;

/// Outcome of parsing a pasted URL list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlList {
    /// Accepted URLs, first occurrence order.
    pub urls: Vec<String>,
    /// Entries that were not `http(s)` URLs.
    pub rejected: Vec<String>,
}

impl UrlList {
    /// Whether nothing usable was found.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Whether `entry` parses as an absolute http(s) URL with a host.
fn is_http_url(entry: &str) -> bool {
    Url::parse(entry)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

/// Split text on whitespace and commas into a de-duplicated URL list.
pub fn parse_url_list(text: &str) -> UrlList {
    let mut seen = HashSet::new();
    let mut list = UrlList::default();

    for entry in text
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        if !is_http_url(entry) {
            list.rejected.push(entry.to_string());
            continue;
        }
        if seen.insert(entry) {
            list.urls.push(entry.to_string());
        }
    }

    list
}
