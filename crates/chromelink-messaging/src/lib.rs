// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chromelink Messaging — everything between a host callback firing and a
// message leaving for the remote side: the messenger seam, single-shot reply
// tokens, instance announcements, and the event forwarder.

pub mod announcer;
pub mod chrome;
pub mod forwarder;
pub mod messenger;
pub mod reply;

pub use announcer::CreationAnnouncer;
pub use chrome::ChromeClientEvents;
pub use forwarder::{EventArgument, EventForwarder};
pub use messenger::{CallId, ChannelMessenger, Envelope, Messenger, ReplyCallback};
pub use reply::PendingReply;
