// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the host runtime.
//
// The browsing engine, its window transport, and the platform's full-screen
// surface are external collaborators. These traits are the exact shapes the
// bridge calls into or is called from; platform glue implements them and the
// `stub` module provides in-process stand-ins for desktop/CI builds.

use std::sync::Arc;

use chromelink_registry::HostObject;

use crate::navigation::{NavigationAttempt, NavigationRequest, SslError};

/// A browsing context owned by the engine.
pub trait WebView: HostObject {
    /// Start loading `url` in this context.
    fn load_url(&self, url: &str);

    /// Install the client the engine consults before every navigation.
    fn set_navigation_interceptor(&self, interceptor: Arc<dyn NavigationInterceptor>);
}

/// Engine-facing navigation hooks (the engine's "web view client").
pub trait NavigationInterceptor: Send + Sync {
    /// Return true to take over the navigation, false to let the engine load
    /// it in `view`.
    fn should_override_url_loading(&self, view: &Arc<dyn WebView>, attempt: &NavigationAttempt)
    -> bool;

    /// Decide what happens when the connection for a load in `view` fails
    /// certificate checks.
    fn on_received_ssl_error(
        &self,
        view: &Arc<dyn WebView>,
        handler: &dyn SslErrorHandler,
        error: &SslError,
    );
}

/// Continuation handed to [`NavigationInterceptor::on_received_ssl_error`].
pub trait SslErrorHandler {
    fn proceed(&self);
    fn cancel(&self);
}

/// Decides whether a navigation destination is acceptable.
///
/// Installed on a chrome client; consulted by the window-open gate for
/// every navigation a probe context attempts.
pub trait NavigationPolicy: Send + Sync {
    fn is_acceptable(&self, origin: &Arc<dyn WebView>, request: &NavigationRequest) -> bool;
}

/// Builds the throwaway context used to evaluate a window-open request.
pub trait ProbeFactory: Send + Sync {
    /// A new context sharing the engine settings of `origin`.
    fn create_probe(&self, origin: &Arc<dyn WebView>) -> Arc<dyn WebView>;
}

/// The slot through which a new browsing context is handed to the engine
/// after a window-open request.
pub trait WindowTransport: Send {
    fn set_web_view(&mut self, view: Arc<dyn WebView>);

    /// Deliver the context set with [`WindowTransport::set_web_view`].
    fn send_to_target(self: Box<Self>);
}

/// A view the engine asks to show full screen (e.g. a video player).
pub trait CustomView: HostObject {}

/// Screen orientation requested while a custom view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenOrientation {
    Portrait,
    Landscape,
}

/// The platform surface that can host a full-screen view.
///
/// Injected into the host-object factory instead of being looked up from
/// process-wide state.
pub trait FullscreenHost: Send + Sync {
    fn enter_fullscreen(&self, view: &Arc<dyn CustomView>, orientation: ScreenOrientation);
    fn exit_fullscreen(&self, view: &Arc<dyn CustomView>, orientation: ScreenOrientation);
}
