// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted host session: plays the browsing engine against one chrome client
// the remote side created. Runs on a blocking thread because several
// callbacks wait for the remote's answer.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument};

use chromelink_core::config::BridgeConfig;
use chromelink_core::error::Result;
use chromelink_core::types::{FileChooserMode, Handle};
use chromelink_host::stub::{
    StubCustomView, StubFullscreenHost, StubProbeFactory, StubTransport, StubWebView,
};
use chromelink_host::{
    AllowedSchemes, ChromeClientCreator, ChromeClientHostApi, FileChooserParams, NavigationShape,
    WebView,
};
use chromelink_messaging::{ChannelMessenger, ChromeClientEvents, EventForwarder};

/// Handle the remote side assigns to the session's chrome client.
pub const CLIENT_HANDLE: Handle = Handle(0);

/// What the session observed on the host side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionReport {
    pub file_chooser_handled: bool,
    pub picked_files: Vec<String>,
    pub confirmed: bool,
    pub windows_accepted: Vec<String>,
    pub windows_rejected: Vec<String>,
    /// URLs the originating page ended up loading after rejected window opens.
    pub redirected_to_origin: Vec<String>,
    pub fullscreen_transitions: usize,
    pub pruned: Vec<Handle>,
}

#[instrument(skip_all)]
pub fn run(config: &BridgeConfig, messenger: ChannelMessenger) -> Result<SessionReport> {
    let forwarder = Arc::new(EventForwarder::connect(config, Arc::new(messenger)));
    let events = Arc::new(ChromeClientEvents::new(forwarder));
    let shape = NavigationShape::from_config(config);
    let fullscreen = Arc::new(StubFullscreenHost::default());
    let creator = ChromeClientCreator::new(config, Arc::new(StubProbeFactory::new(shape)))
        .with_fullscreen(Arc::clone(&fullscreen) as _);
    let api = ChromeClientHostApi::new(events, creator);
    let registry = Arc::clone(api.registry());

    // Remote side: create and configure the client.
    let client = api.create(CLIENT_HANDLE)?;
    api.set_navigation_policy(CLIENT_HANDLE, Arc::new(AllowedSchemes::secure_only()))?;
    api.set_synchronous_return_value_for_on_show_file_chooser(CLIENT_HANDLE, true)?;

    let page = StubWebView::new(shape);
    let view: Arc<dyn WebView> = Arc::clone(&page) as _;
    let mut report = SessionReport::default();

    for progress in [10, 45, 100] {
        client.on_progress_changed(&view, progress)?;
    }
    client.on_received_title(&view, "Example Domain")?;

    let params = Arc::new(FileChooserParams {
        capture_enabled: false,
        accept_types: vec!["image/*".into()],
        mode: FileChooserMode::Open,
        filename_hint: None,
    });
    let (picked_tx, picked_rx) = oneshot::channel();
    report.file_chooser_handled = client.on_show_file_chooser(
        &view,
        &params,
        Box::new(move |paths| {
            if picked_tx.send(paths).is_err() {
                debug!("file selection arrived after the session stopped waiting");
            }
        }),
    )?;
    if report.file_chooser_handled {
        report.picked_files = picked_rx.blocking_recv().unwrap_or_default();
    }

    report.confirmed = client.on_js_confirm(&view, "https://example.org/form", "Submit form?")?;

    for target in ["https://example.org/popup", "http://insecure.example"] {
        let (transport, _slot) = StubTransport::new();
        if client.on_create_window(&view, false, true, Some(target), transport) {
            report.windows_accepted.push(target.to_string());
        } else {
            report.windows_rejected.push(target.to_string());
        }
    }
    report.redirected_to_origin = page.loaded_urls();

    client.on_show_custom_view(Arc::new(StubCustomView));
    client.on_hide_custom_view();
    report.fullscreen_transitions = fullscreen.events().len();

    // Remote side disposes the client. Probes hold the page through their
    // interceptors, so `api` (and its probe factory) goes before pruning.
    api.dispose(CLIENT_HANDLE);
    drop((client, view, page, params, api));
    report.pruned = registry.prune_stale();
    registry.close();

    info!(
        accepted = report.windows_accepted.len(),
        rejected = report.windows_rejected.len(),
        pruned = report.pruned.len(),
        "session finished"
    );
    Ok(report)
}
