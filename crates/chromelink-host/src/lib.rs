// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chromelink Host — the chrome client the browsing engine calls into, the
// window-open security gate, and the factory the remote side drives.
//
// Engine objects are reached only through the traits in `traits`; the `stub`
// module supplies in-process implementations for desktop/CI builds.

pub mod chrome_client;
pub mod host_api;
pub mod navigation;
pub mod stub;
pub mod traits;
pub mod window_gate;

pub use chrome_client::{ChromeClient, FileChooserParams, FilePathCallback};
pub use host_api::{ChromeClientCreator, ChromeClientHostApi};
pub use navigation::{AllowedSchemes, NavigationAttempt, NavigationRequest, NavigationShape};
pub use traits::{
    CustomView, FullscreenHost, NavigationInterceptor, NavigationPolicy, ProbeFactory,
    ScreenOrientation, SslErrorHandler, WebView, WindowTransport,
};
pub use window_gate::{GateState, WindowOpenGate, WindowOpenRequest};
