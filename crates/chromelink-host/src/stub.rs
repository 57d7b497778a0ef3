// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process stand-ins for the browsing engine's host objects.
//
// Used on desktop/CI where no engine is linked: they record what the bridge
// asked of them so a session (or a test) can inspect it afterwards.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use chromelink_core::types::InstanceDescriptor;
use chromelink_registry::HostObject;

use crate::navigation::{NavigationRequest, NavigationShape};
use crate::traits::{
    CustomView, FullscreenHost, NavigationInterceptor, ProbeFactory, ScreenOrientation,
    SslErrorHandler, WebView, WindowTransport,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Web views
// ---------------------------------------------------------------------------

/// A browsing context that records the URLs it loads.
pub struct StubWebView {
    shape: NavigationShape,
    loaded: Mutex<Vec<String>>,
    interceptor: Mutex<Option<Arc<dyn NavigationInterceptor>>>,
}

impl StubWebView {
    pub fn new(shape: NavigationShape) -> Arc<Self> {
        Arc::new(Self {
            shape,
            loaded: Mutex::new(Vec::new()),
            interceptor: Mutex::new(None),
        })
    }

    pub fn loaded_urls(&self) -> Vec<String> {
        lock(&self.loaded).clone()
    }

    pub fn has_interceptor(&self) -> bool {
        lock(&self.interceptor).is_some()
    }

    /// Act like the engine following a link to `url`: consult the installed
    /// interceptor, then load here unless it took over. Returns whether the
    /// URL was loaded in this view.
    pub fn navigate(self: &Arc<Self>, url: &str) -> bool {
        let interceptor = lock(&self.interceptor).clone();
        let overridden = interceptor.is_some_and(|interceptor| {
            let view: Arc<dyn WebView> = Arc::clone(self) as Arc<dyn WebView>;
            let attempt = self.shape.attempt(NavigationRequest::for_url(url));
            interceptor.should_override_url_loading(&view, &attempt)
        });
        if !overridden {
            self.load_url(url);
        }
        !overridden
    }
}

impl HostObject for StubWebView {
    fn describe(&self) -> InstanceDescriptor {
        InstanceDescriptor::WebView
    }
}

impl WebView for StubWebView {
    fn load_url(&self, url: &str) {
        debug!(url, "stub web view loading");
        lock(&self.loaded).push(url.to_string());
    }

    fn set_navigation_interceptor(&self, interceptor: Arc<dyn NavigationInterceptor>) {
        *lock(&self.interceptor) = Some(interceptor);
    }
}

/// Creates [`StubWebView`] probes and keeps them for inspection.
pub struct StubProbeFactory {
    shape: NavigationShape,
    created: Mutex<Vec<Arc<StubWebView>>>,
}

impl StubProbeFactory {
    pub fn new(shape: NavigationShape) -> Self {
        Self {
            shape,
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn probes(&self) -> Vec<Arc<StubWebView>> {
        lock(&self.created).clone()
    }
}

impl ProbeFactory for StubProbeFactory {
    fn create_probe(&self, _origin: &Arc<dyn WebView>) -> Arc<dyn WebView> {
        let probe = StubWebView::new(self.shape);
        lock(&self.created).push(Arc::clone(&probe));
        probe
    }
}

// ---------------------------------------------------------------------------
// Window transport
// ---------------------------------------------------------------------------

/// Where a [`StubTransport`] delivers its view.
#[derive(Clone, Default)]
pub struct DeliverySlot(Arc<Mutex<Option<Arc<dyn WebView>>>>);

impl DeliverySlot {
    pub fn is_delivered(&self) -> bool {
        lock(&self.0).is_some()
    }

    pub fn take(&self) -> Option<Arc<dyn WebView>> {
        lock(&self.0).take()
    }
}

pub struct StubTransport {
    view: Option<Arc<dyn WebView>>,
    slot: DeliverySlot,
}

impl StubTransport {
    pub fn new() -> (Box<Self>, DeliverySlot) {
        let slot = DeliverySlot::default();
        let transport = Box::new(Self {
            view: None,
            slot: slot.clone(),
        });
        (transport, slot)
    }
}

impl WindowTransport for StubTransport {
    fn set_web_view(&mut self, view: Arc<dyn WebView>) {
        self.view = Some(view);
    }

    fn send_to_target(self: Box<Self>) {
        *lock(&self.slot.0) = self.view;
    }
}

// ---------------------------------------------------------------------------
// Certificate errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslDecision {
    Proceed,
    Cancel,
}

#[derive(Default)]
pub struct StubSslHandler {
    decision: Mutex<Option<SslDecision>>,
}

impl StubSslHandler {
    pub fn decision(&self) -> Option<SslDecision> {
        *lock(&self.decision)
    }
}

impl SslErrorHandler for StubSslHandler {
    fn proceed(&self) {
        *lock(&self.decision) = Some(SslDecision::Proceed);
    }

    fn cancel(&self) {
        *lock(&self.decision) = Some(SslDecision::Cancel);
    }
}

// ---------------------------------------------------------------------------
// Full screen
// ---------------------------------------------------------------------------

pub struct StubCustomView;

impl HostObject for StubCustomView {
    fn describe(&self) -> InstanceDescriptor {
        InstanceDescriptor::CustomView
    }
}

impl CustomView for StubCustomView {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenEvent {
    Entered(ScreenOrientation),
    Exited(ScreenOrientation),
}

#[derive(Default)]
pub struct StubFullscreenHost {
    events: Mutex<Vec<FullscreenEvent>>,
}

impl StubFullscreenHost {
    pub fn events(&self) -> Vec<FullscreenEvent> {
        lock(&self.events).clone()
    }
}

impl FullscreenHost for StubFullscreenHost {
    fn enter_fullscreen(&self, _view: &Arc<dyn CustomView>, orientation: ScreenOrientation) {
        lock(&self.events).push(FullscreenEvent::Entered(orientation));
    }

    fn exit_fullscreen(&self, _view: &Arc<dyn CustomView>, orientation: ScreenOrientation) {
        lock(&self.events).push(FullscreenEvent::Exited(orientation));
    }
}
