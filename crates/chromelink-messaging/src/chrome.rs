// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed chrome-client events on top of the generic forwarder. One method per
// remote-side API call, with the fixed parameter order the remote expects:
// the client's handle, then the web view's, then any further objects.

use std::sync::Arc;

use chromelink_core::error::Result;
use chromelink_core::types::EventPayload;
use chromelink_registry::HostObject;

use crate::forwarder::{EventArgument, EventForwarder};
use crate::messenger::ReplyCallback;
use crate::reply::PendingReply;

/// Sends chrome-client callbacks to the remote side.
pub struct ChromeClientEvents {
    forwarder: Arc<EventForwarder>,
}

impl ChromeClientEvents {
    pub fn new(forwarder: Arc<EventForwarder>) -> Self {
        Self { forwarder }
    }

    pub fn forwarder(&self) -> &Arc<EventForwarder> {
        &self.forwarder
    }

    pub fn on_progress_changed<C, W>(
        &self,
        client: &Arc<C>,
        web_view: &Arc<W>,
        progress: i64,
    ) -> Result<PendingReply>
    where
        C: HostObject + ?Sized,
        W: HostObject + ?Sized,
    {
        self.forwarder.forward(
            client,
            &[web_view as &dyn EventArgument],
            EventPayload::ProgressChanged { progress },
        )
    }

    pub fn on_received_title<C, W>(
        &self,
        client: &Arc<C>,
        web_view: &Arc<W>,
        title: &str,
    ) -> Result<PendingReply>
    where
        C: HostObject + ?Sized,
        W: HostObject + ?Sized,
    {
        self.forwarder.forward(
            client,
            &[web_view as &dyn EventArgument],
            EventPayload::ReceivedTitle {
                title: title.to_string(),
            },
        )
    }

    /// The remote's list of chosen paths goes to `reply` whenever it
    /// arrives; this call never waits for it.
    pub fn on_show_file_chooser<C, W, P>(
        &self,
        client: &Arc<C>,
        web_view: &Arc<W>,
        params: &Arc<P>,
        reply: ReplyCallback,
    ) -> Result<()>
    where
        C: HostObject + ?Sized,
        W: HostObject + ?Sized,
        P: HostObject + ?Sized,
    {
        self.forwarder.dispatch(
            client,
            &[web_view as &dyn EventArgument, params],
            EventPayload::ShowFileChooser,
            reply,
        )
    }

    /// Blocks the calling thread until the remote side decides.
    pub fn on_js_confirm<C, W>(
        &self,
        client: &Arc<C>,
        web_view: &Arc<W>,
        url: &str,
        message: &str,
    ) -> Result<bool>
    where
        C: HostObject + ?Sized,
        W: HostObject + ?Sized,
    {
        self.forwarder
            .forward_and_wait(
                client,
                &[web_view as &dyn EventArgument],
                EventPayload::JsConfirm {
                    url: url.to_string(),
                    message: message.to_string(),
                },
            )?
            .into_bool()
    }
}
