// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The seam to the generated messaging layer.
//
// A `Messenger` takes one message and one reply callback per call. The layer
// behind it delivers calls in order and invokes the callback at most once;
// dropping the callback unanswered closes the caller's reply token.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::trace;

use chromelink_core::error::{BridgeError, Result};
use chromelink_core::types::{RemoteMessage, ReplyValue};

/// Invoked with the remote side's reply.
pub type ReplyCallback = Box<dyn FnOnce(ReplyValue) + Send>;

/// Outbound channel to the remote side.
pub trait Messenger: Send + Sync {
    /// Queue `message` for delivery. Never blocks on the remote side.
    fn send(&self, message: RemoteMessage, reply: ReplyCallback) -> Result<()>;
}

/// Correlation id of one call on a [`ChannelMessenger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(pub u64);

/// One call as seen by the receiving end of a [`ChannelMessenger`].
pub struct Envelope {
    pub call: CallId,
    pub message: RemoteMessage,
    reply: ReplyCallback,
}

impl Envelope {
    /// Answer the call. Consumes the envelope, so a call is answered at most
    /// once.
    pub fn reply(self, value: ReplyValue) {
        trace!(call = self.call.0, reply = ?value.kind(), "replying to call");
        (self.reply)(value)
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("call", &self.call)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// In-process messenger over an unbounded tokio channel.
///
/// Sends from one thread arrive in the order they were made.
pub struct ChannelMessenger {
    sender: mpsc::UnboundedSender<Envelope>,
    next_call: AtomicU64,
}

impl ChannelMessenger {
    /// Create the messenger and the receiver the remote side drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let messenger = Self {
            sender,
            next_call: AtomicU64::new(1),
        };
        (messenger, receiver)
    }
}

impl Messenger for ChannelMessenger {
    fn send(&self, message: RemoteMessage, reply: ReplyCallback) -> Result<()> {
        let call = CallId(self.next_call.fetch_add(1, Ordering::SeqCst));
        self.sender
            .send(Envelope {
                call,
                message,
                reply,
            })
            .map_err(|_| BridgeError::Messenger("remote receiver has shut down".into()))
    }
}
