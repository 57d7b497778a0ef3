// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Window-open security gate.
//
// A page asking for a new window never gets a real browsing context
// directly. The gate builds a throwaway probe context whose every navigation
// is put to the navigation policy; rejected destinations are loaded in the
// originating context instead. Runs synchronously on the engine's thread and
// never talks to the remote side.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, instrument, warn};

use chromelink_core::error::{BridgeError, Result};

use crate::navigation::{NavigationAttempt, NavigationRequest, NavigationShape, SslError};
use crate::traits::{
    NavigationInterceptor, NavigationPolicy, ProbeFactory, SslErrorHandler, WebView,
    WindowTransport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    AwaitingPolicyDecision,
}

/// One window-open callback from the engine.
pub struct WindowOpenRequest {
    pub origin: Arc<dyn WebView>,
    pub is_dialog: bool,
    pub is_user_gesture: bool,
    /// Destination the page asked for, when the engine reports it up front.
    pub target_url: Option<String>,
    pub transport: Box<dyn WindowTransport>,
}

/// Installed on every probe context.
pub struct ProbeInterceptor {
    origin: Arc<dyn WebView>,
    policy: Arc<dyn NavigationPolicy>,
}

impl ProbeInterceptor {
    pub fn new(origin: Arc<dyn WebView>, policy: Arc<dyn NavigationPolicy>) -> Self {
        Self { origin, policy }
    }
}

impl NavigationInterceptor for ProbeInterceptor {
    fn should_override_url_loading(
        &self,
        _probe: &Arc<dyn WebView>,
        attempt: &NavigationAttempt,
    ) -> bool {
        let request = attempt.to_request();
        if self.policy.is_acceptable(&self.origin, &request) {
            debug!(url = %request.url, "navigation accepted for new window");
            return false;
        }
        info!(url = %request.url, "navigation rejected; loading in originating view");
        self.origin.load_url(&request.url);
        true
    }

    fn on_received_ssl_error(
        &self,
        _probe: &Arc<dyn WebView>,
        handler: &dyn SslErrorHandler,
        error: &SslError,
    ) {
        debug!(url = %error.url, kind = ?error.kind, "probe certificate error; proceeding");
        handler.proceed();
    }
}

/// Counts one in-flight decision for as long as it lives, however the
/// decision finishes.
struct Awaiting<'a>(&'a AtomicUsize);

impl<'a> Awaiting<'a> {
    fn enter(pending: &'a AtomicUsize) -> Self {
        pending.fetch_add(1, Ordering::SeqCst);
        Self(pending)
    }
}

impl Drop for Awaiting<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The gate is `Idle` only when no window-open decision is in flight on any
/// thread.
pub struct WindowOpenGate {
    policy: RwLock<Option<Arc<dyn NavigationPolicy>>>,
    probes: Arc<dyn ProbeFactory>,
    shape: NavigationShape,
    pending: AtomicUsize,
}

impl WindowOpenGate {
    pub fn new(probes: Arc<dyn ProbeFactory>, shape: NavigationShape) -> Self {
        Self {
            policy: RwLock::new(None),
            probes,
            shape,
            pending: AtomicUsize::new(0),
        }
    }

    pub fn set_policy(&self, policy: Arc<dyn NavigationPolicy>) {
        *self.policy.write().unwrap_or_else(PoisonError::into_inner) = Some(policy);
    }

    pub fn has_policy(&self) -> bool {
        self.policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn state(&self) -> GateState {
        if self.pending.load(Ordering::SeqCst) == 0 {
            GateState::Idle
        } else {
            GateState::AwaitingPolicyDecision
        }
    }

    /// Engine entry point: whether a new window was handed over.
    #[instrument(skip_all, fields(dialog = request.is_dialog, gesture = request.is_user_gesture))]
    pub fn on_create_window(&self, request: WindowOpenRequest) -> bool {
        match self.evaluate(request) {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "window open denied");
                false
            }
        }
    }

    /// Decide a window-open request.
    ///
    /// `Err(PolicyDelegateMissing)` when no policy is installed. On
    /// rejection the probe is dropped without reaching the transport.
    pub fn evaluate(&self, request: WindowOpenRequest) -> Result<bool> {
        let policy = self
            .policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(BridgeError::PolicyDelegateMissing)?;
        let _awaiting = Awaiting::enter(&self.pending);

        let WindowOpenRequest {
            origin,
            target_url,
            mut transport,
            ..
        } = request;

        let probe = self.probes.create_probe(&origin);
        let interceptor = Arc::new(ProbeInterceptor::new(origin, policy));
        probe.set_navigation_interceptor(Arc::clone(&interceptor) as Arc<dyn NavigationInterceptor>);

        if let Some(url) = target_url {
            let attempt = self.shape.attempt(NavigationRequest::for_url(url));
            if interceptor.should_override_url_loading(&probe, &attempt) {
                return Ok(false);
            }
        }

        transport.set_web_view(probe);
        transport.send_to_target();
        debug!("new window handed to engine");
        Ok(true)
    }
}
