// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The host-side chrome client: receives the engine's UI callbacks, forwards
// them to the remote side, and answers the engine with the values it needs.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, instrument, warn};

use chromelink_core::error::Result;
use chromelink_core::types::{FileChooserMode, InstanceDescriptor};
use chromelink_messaging::ChromeClientEvents;
use chromelink_registry::HostObject;

use crate::traits::{
    CustomView, FullscreenHost, NavigationPolicy, ScreenOrientation, WebView, WindowTransport,
};
use crate::window_gate::{WindowOpenGate, WindowOpenRequest};

/// Receives the paths the user picked in a file chooser.
pub type FilePathCallback = Box<dyn FnOnce(Vec<String>) + Send>;

/// Parameters of one file-chooser request, announced to the remote side with
/// all of their fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChooserParams {
    pub capture_enabled: bool,
    pub accept_types: Vec<String>,
    pub mode: FileChooserMode,
    pub filename_hint: Option<String>,
}

impl HostObject for FileChooserParams {
    fn describe(&self) -> InstanceDescriptor {
        InstanceDescriptor::FileChooserParams {
            capture_enabled: self.capture_enabled,
            accept_types: self.accept_types.clone(),
            mode: self.mode,
            filename_hint: self.filename_hint.clone(),
        }
    }
}

pub struct ChromeClient {
    events: Arc<ChromeClientEvents>,
    gate: WindowOpenGate,
    fullscreen: Option<Arc<dyn FullscreenHost>>,
    file_chooser_return: AtomicBool,
    custom_view: Mutex<Option<Arc<dyn CustomView>>>,
}

impl HostObject for ChromeClient {
    fn describe(&self) -> InstanceDescriptor {
        InstanceDescriptor::ChromeClient
    }
}

impl fmt::Debug for ChromeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromeClient")
            .field("file_chooser_return", &self.return_value_for_file_chooser())
            .field("gate_state", &self.gate.state())
            .field("has_policy", &self.gate.has_policy())
            .field("has_fullscreen", &self.fullscreen.is_some())
            .finish_non_exhaustive()
    }
}

impl ChromeClient {
    pub fn new(
        events: Arc<ChromeClientEvents>,
        gate: WindowOpenGate,
        fullscreen: Option<Arc<dyn FullscreenHost>>,
        file_chooser_return: bool,
    ) -> Self {
        Self {
            events,
            gate,
            fullscreen,
            file_chooser_return: AtomicBool::new(file_chooser_return),
            custom_view: Mutex::new(None),
        }
    }

    pub fn gate(&self) -> &WindowOpenGate {
        &self.gate
    }

    /// Value `on_show_file_chooser` returns to the engine from now on.
    pub fn set_return_value_for_file_chooser(&self, value: bool) {
        self.file_chooser_return.store(value, Ordering::SeqCst);
    }

    pub fn return_value_for_file_chooser(&self) -> bool {
        self.file_chooser_return.load(Ordering::SeqCst)
    }

    pub fn set_navigation_policy(&self, policy: Arc<dyn NavigationPolicy>) {
        self.gate.set_policy(policy);
    }

    pub fn on_progress_changed(
        self: &Arc<Self>,
        view: &Arc<dyn WebView>,
        progress: i32,
    ) -> Result<()> {
        self.events
            .on_progress_changed(self, view, i64::from(progress))
            .map(drop)
    }

    pub fn on_received_title(self: &Arc<Self>, view: &Arc<dyn WebView>, title: &str) -> Result<()> {
        self.events.on_received_title(self, view, title).map(drop)
    }

    /// Returns the pre-decided value at once. `file_paths` gets the remote's
    /// selection later, and only when that value was `true`; otherwise the
    /// engine has already been told the chooser is not handled.
    #[instrument(skip_all)]
    pub fn on_show_file_chooser(
        self: &Arc<Self>,
        view: &Arc<dyn WebView>,
        params: &Arc<FileChooserParams>,
        file_paths: FilePathCallback,
    ) -> Result<bool> {
        let handled = self.return_value_for_file_chooser();
        self.events.on_show_file_chooser(
            self,
            view,
            params,
            Box::new(move |reply| {
                if !handled {
                    debug!("file chooser not handled; dropping remote selection");
                    return;
                }
                match reply.into_strings() {
                    Ok(paths) => file_paths(paths),
                    Err(e) => warn!(error = %e, "file chooser reply was not a path list"),
                }
            }),
        )?;
        Ok(handled)
    }

    /// Blocks until the remote side answers.
    pub fn on_js_confirm(
        self: &Arc<Self>,
        view: &Arc<dyn WebView>,
        url: &str,
        message: &str,
    ) -> Result<bool> {
        self.events.on_js_confirm(self, view, url, message)
    }

    pub fn on_create_window(
        &self,
        view: &Arc<dyn WebView>,
        is_dialog: bool,
        is_user_gesture: bool,
        target_url: Option<&str>,
        transport: Box<dyn WindowTransport>,
    ) -> bool {
        self.gate.on_create_window(WindowOpenRequest {
            origin: Arc::clone(view),
            is_dialog,
            is_user_gesture,
            target_url: target_url.map(str::to_string),
            transport,
        })
    }

    pub fn on_show_custom_view(&self, view: Arc<dyn CustomView>) {
        let Some(host) = &self.fullscreen else {
            warn!("no fullscreen host; custom view ignored");
            return;
        };
        host.enter_fullscreen(&view, ScreenOrientation::Landscape);
        *self
            .custom_view
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(view);
    }

    pub fn on_hide_custom_view(&self) {
        let shown = self
            .custom_view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let (Some(view), Some(host)) = (shown, &self.fullscreen) {
            host.exit_fullscreen(&view, ScreenOrientation::Portrait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{AllowedSchemes, NavigationShape};
    use crate::stub::{
        FullscreenEvent, StubCustomView, StubFullscreenHost, StubProbeFactory, StubTransport,
        StubWebView,
    };
    use chromelink_core::config::BridgeConfig;
    use chromelink_core::types::{Handle, RemoteMessage, ReplyValue};
    use chromelink_messaging::{ChannelMessenger, Envelope, EventForwarder};
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        client: Arc<ChromeClient>,
        view: Arc<dyn WebView>,
        fullscreen: Arc<StubFullscreenHost>,
        receiver: UnboundedReceiver<Envelope>,
    }

    fn fixture() -> Fixture {
        let (messenger, receiver) = ChannelMessenger::new();
        let forwarder = Arc::new(EventForwarder::connect(
            &BridgeConfig::default(),
            Arc::new(messenger),
        ));
        let events = Arc::new(ChromeClientEvents::new(Arc::clone(&forwarder)));
        let probes = Arc::new(StubProbeFactory::new(NavigationShape::Request));
        let fullscreen = Arc::new(StubFullscreenHost::default());
        let client = Arc::new(ChromeClient::new(
            events,
            WindowOpenGate::new(probes, NavigationShape::Request),
            Some(Arc::clone(&fullscreen) as Arc<dyn FullscreenHost>),
            false,
        ));
        forwarder
            .registry()
            .register_remote_created(&client, Handle(3))
            .expect("register client");
        Fixture {
            client,
            view: StubWebView::new(NavigationShape::Request),
            fullscreen,
            receiver,
        }
    }

    fn params() -> Arc<FileChooserParams> {
        Arc::new(FileChooserParams {
            capture_enabled: false,
            accept_types: vec!["image/png".into()],
            mode: FileChooserMode::OpenMultiple,
            filename_hint: Some("scan.png".into()),
        })
    }

    fn reply_to_event(receiver: &mut UnboundedReceiver<Envelope>, value: ReplyValue) {
        while let Ok(envelope) = receiver.try_recv() {
            if matches!(envelope.message, RemoteMessage::Event(_)) {
                envelope.reply(value);
                return;
            }
        }
        panic!("no event envelope queued");
    }

    #[test]
    fn file_chooser_returns_predecided_true_and_delivers_paths() {
        let mut fx = fixture();
        fx.client.set_return_value_for_file_chooser(true);
        let picked = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&picked);

        let handled = fx
            .client
            .on_show_file_chooser(
                &fx.view,
                &params(),
                Box::new(move |paths| *sink.lock().expect("sink lock") = Some(paths)),
            )
            .expect("show file chooser");
        assert!(handled);

        reply_to_event(
            &mut fx.receiver,
            ReplyValue::Strings(vec!["content://media/1".into()]),
        );
        assert_eq!(
            picked.lock().expect("picked lock").clone(),
            Some(vec!["content://media/1".to_string()])
        );
    }

    #[test]
    fn file_chooser_true_holds_against_mismatched_replies() {
        for reply in [ReplyValue::Bool(false), ReplyValue::Void] {
            let mut fx = fixture();
            fx.client.set_return_value_for_file_chooser(true);
            let called = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&called);

            let handled = fx
                .client
                .on_show_file_chooser(
                    &fx.view,
                    &params(),
                    Box::new(move |_| flag.store(true, Ordering::SeqCst)),
                )
                .expect("show file chooser");
            assert!(handled);

            reply_to_event(&mut fx.receiver, reply);
            assert!(!called.load(Ordering::SeqCst));
            assert!(fx.client.return_value_for_file_chooser());
        }
    }

    #[test]
    fn file_chooser_false_ignores_remote_selection() {
        let mut fx = fixture();
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);

        let handled = fx
            .client
            .on_show_file_chooser(
                &fx.view,
                &params(),
                Box::new(move |_| flag.store(true, Ordering::SeqCst)),
            )
            .expect("show file chooser");
        assert!(!handled);

        reply_to_event(
            &mut fx.receiver,
            ReplyValue::Strings(vec!["content://media/1".into()]),
        );
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn progress_precedes_title_under_concurrency() {
        let mut fx = fixture();
        let client = Arc::clone(&fx.client);

        let noise: Vec<_> = (0..100)
            .map(|_| {
                let client = Arc::clone(&client);
                std::thread::spawn(move || {
                    let other: Arc<dyn WebView> = StubWebView::new(NavigationShape::Request);
                    client
                        .on_progress_changed(&other, 1)
                        .expect("noise progress");
                })
            })
            .collect();

        fx.client
            .on_progress_changed(&fx.view, 100)
            .expect("progress");
        fx.client
            .on_received_title(&fx.view, "Example Domain")
            .expect("title");
        for thread in noise {
            thread.join().expect("noise thread");
        }

        let mut view_handle = None;
        let mut methods = Vec::new();
        while let Ok(envelope) = fx.receiver.try_recv() {
            if let RemoteMessage::Event(event) = envelope.message {
                if event.payload.method_name() == "onReceivedTitle" {
                    view_handle = event.arguments.first().copied();
                }
                methods.push((event.arguments, event.payload));
            }
        }
        let view_handle = view_handle.expect("title event seen");
        let for_view: Vec<_> = methods
            .into_iter()
            .filter(|(args, _)| args.first() == Some(&view_handle))
            .map(|(_, payload)| payload.method_name())
            .collect();
        assert_eq!(for_view, vec!["onProgressChanged", "onReceivedTitle"]);
    }

    #[test]
    fn js_confirm_waits_for_remote() {
        let mut fx = fixture();
        let remote = std::thread::spawn(move || {
            while let Some(envelope) = fx.receiver.blocking_recv() {
                if matches!(envelope.message, RemoteMessage::Event(_)) {
                    envelope.reply(ReplyValue::Bool(true));
                    return;
                }
            }
        });

        let confirmed = fx
            .client
            .on_js_confirm(&fx.view, "https://example.org", "Submit form?")
            .expect("confirm");
        assert!(confirmed);
        remote.join().expect("remote thread");
    }

    #[test]
    fn create_window_goes_through_policy() {
        let fx = fixture();
        let (transport, slot) = StubTransport::new();
        assert!(!fx.client.on_create_window(&fx.view, false, true, None, transport));
        assert!(!slot.is_delivered());

        fx.client
            .set_navigation_policy(Arc::new(AllowedSchemes::secure_only()));
        let (transport, slot) = StubTransport::new();
        assert!(fx.client.on_create_window(
            &fx.view,
            false,
            true,
            Some("https://example.org"),
            transport
        ));
        assert!(slot.is_delivered());
    }

    #[test]
    fn custom_view_round_trip() {
        let fx = fixture();
        fx.client.on_hide_custom_view();
        assert!(fx.fullscreen.events().is_empty());

        fx.client.on_show_custom_view(Arc::new(StubCustomView));
        fx.client.on_hide_custom_view();
        assert_eq!(
            fx.fullscreen.events(),
            vec![
                FullscreenEvent::Entered(ScreenOrientation::Landscape),
                FullscreenEvent::Exited(ScreenOrientation::Portrait),
            ]
        );
    }
}
