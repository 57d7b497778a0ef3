// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pending-reply tokens: one in-flight round trip to the remote side.

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::trace;

use chromelink_core::error::{BridgeError, Result};
use chromelink_core::types::{ReplyKind, ReplyValue};

use crate::messenger::ReplyCallback;

/// Resolves exactly once, when the remote side replies.
///
/// The reply callback handed to the messenger is the only writer. There is
/// no timeout and no cancellation: a remote that never answers leaves
/// [`PendingReply::wait`] blocked, and a messenger that drops the callback
/// unanswered resolves the token with [`BridgeError::ReplyChannelClosed`].
#[derive(Debug)]
pub struct PendingReply {
    expected: ReplyKind,
    receiver: oneshot::Receiver<ReplyValue>,
}

impl PendingReply {
    /// Create a token and the callback that resolves it.
    pub fn channel(expected: ReplyKind) -> (ReplyCallback, Self) {
        let (sender, receiver) = oneshot::channel();
        let callback: ReplyCallback = Box::new(move |value| {
            if sender.send(value).is_err() {
                trace!("reply arrived after its token was dropped");
            }
        });
        (callback, Self { expected, receiver })
    }

    /// Shape of reply the call expects.
    pub fn expected(&self) -> ReplyKind {
        self.expected
    }

    /// Block the current thread until the reply arrives.
    ///
    /// For host callback threads. Panics if called from inside an async
    /// runtime; use [`PendingReply::resolved`] there.
    pub fn wait(self) -> Result<ReplyValue> {
        self.receiver
            .blocking_recv()
            .map_err(|_| BridgeError::ReplyChannelClosed)
    }

    /// Block until the reply arrives and read it as a boolean.
    pub fn wait_bool(self) -> Result<bool> {
        self.wait()?.into_bool()
    }

    /// Await the reply.
    pub async fn resolved(self) -> Result<ReplyValue> {
        self.receiver
            .await
            .map_err(|_| BridgeError::ReplyChannelClosed)
    }

    /// Take the reply if it has already arrived.
    pub fn try_take(&mut self) -> Option<Result<ReplyValue>> {
        match self.receiver.try_recv() {
            Ok(value) => Some(Ok(value)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(BridgeError::ReplyChannelClosed)),
        }
    }
}
