// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Navigation requests and the two call shapes engines use to present them.
//
// Newer engines pass a full request (URL, frame, gesture, method, headers);
// older ones pass only the URL string. Both shapes normalize into one
// `NavigationRequest` so policy code never sees the difference.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use chromelink_core::config::BridgeConfig;

use crate::traits::{NavigationPolicy, WebView};

/// A navigation the engine is about to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub url: String,
    pub is_main_frame: bool,
    pub has_gesture: bool,
    pub method: String,
    pub headers: BTreeMap<String, String>,
}

impl NavigationRequest {
    /// A plain top-level GET of `url`, as reconstructed from a legacy call.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_main_frame: true,
            has_gesture: false,
            method: "GET".into(),
            headers: BTreeMap::new(),
        }
    }
}

/// A navigation as the engine delivered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationAttempt {
    Request(NavigationRequest),
    Legacy { url: String },
}

impl NavigationAttempt {
    pub fn url(&self) -> &str {
        match self {
            Self::Request(request) => &request.url,
            Self::Legacy { url } => url,
        }
    }

    /// Normalize either shape into a full request.
    pub fn to_request(&self) -> NavigationRequest {
        match self {
            Self::Request(request) => request.clone(),
            Self::Legacy { url } => NavigationRequest::for_url(url.clone()),
        }
    }
}

/// Which call shape the running engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationShape {
    Request,
    Legacy,
}

impl NavigationShape {
    /// Pick the shape from the engine's API level.
    pub fn probe(host_api_level: u32, request_min_api: u32) -> Self {
        let shape = if host_api_level >= request_min_api {
            Self::Request
        } else {
            Self::Legacy
        };
        debug!(host_api_level, request_min_api, ?shape, "probed navigation shape");
        shape
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::probe(config.host_api_level, config.navigation_request_min_api)
    }

    /// Present `request` the way an engine of this shape would.
    pub fn attempt(self, request: NavigationRequest) -> NavigationAttempt {
        match self {
            Self::Request => NavigationAttempt::Request(request),
            Self::Legacy => NavigationAttempt::Legacy { url: request.url },
        }
    }
}

/// Why a certificate check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslErrorKind {
    NotYetValid,
    Expired,
    IdMismatch,
    Untrusted,
    DateInvalid,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslError {
    pub url: String,
    pub kind: SslErrorKind,
}

/// Accepts navigations whose URL scheme is in an allow list.
///
/// Unparseable URLs are rejected.
#[derive(Debug, Clone)]
pub struct AllowedSchemes {
    schemes: Vec<String>,
}

impl AllowedSchemes {
    pub fn new<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemes: schemes
                .into_iter()
                .map(|s| s.into().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Only `https`.
    pub fn secure_only() -> Self {
        Self::new(["https"])
    }

    pub fn allows(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => self.schemes.iter().any(|s| s == parsed.scheme()),
            Err(_) => false,
        }
    }
}

impl NavigationPolicy for AllowedSchemes {
    fn is_acceptable(&self, _origin: &Arc<dyn WebView>, request: &NavigationRequest) -> bool {
        self.allows(&request.url)
    }
}
