// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: handles, instance descriptors, and the messages that
// travel to the remote side.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Integer identifier by which the remote side refers to a host object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub u64);

impl Handle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a registry entry keeps its object alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    Strong,
    Weak,
}

/// Classes of host object that cross the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceKind {
    WebView,
    ChromeClient,
    FileChooserParams,
    CustomView,
}

/// File-chooser modes exposed by the browsing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileChooserMode {
    Open,
    OpenMultiple,
    Save,
}

/// Everything the remote side needs to build its proxy for a host instance.
///
/// Sent inside [`RemoteMessage::Create`] when the host announces an instance
/// the remote has not seen yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstanceDescriptor {
    WebView,
    ChromeClient,
    FileChooserParams {
        capture_enabled: bool,
        accept_types: Vec<String>,
        mode: FileChooserMode,
        filename_hint: Option<String>,
    },
    CustomView,
}

impl InstanceDescriptor {
    pub fn kind(&self) -> InstanceKind {
        match self {
            Self::WebView => InstanceKind::WebView,
            Self::ChromeClient => InstanceKind::ChromeClient,
            Self::FileChooserParams { .. } => InstanceKind::FileChooserParams,
            Self::CustomView => InstanceKind::CustomView,
        }
    }
}

/// Event-specific payload of an outbound event message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventPayload {
    ProgressChanged { progress: i64 },
    ReceivedTitle { title: String },
    ShowFileChooser,
    JsConfirm { url: String, message: String },
}

impl EventPayload {
    /// Method name on the remote-side API.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::ProgressChanged { .. } => "onProgressChanged",
            Self::ReceivedTitle { .. } => "onReceivedTitle",
            Self::ShowFileChooser => "onShowFileChooser",
            Self::JsConfirm { .. } => "onJsConfirm",
        }
    }

    /// Shape of the reply the remote side sends back.
    pub fn reply_kind(&self) -> ReplyKind {
        match self {
            Self::ProgressChanged { .. } | Self::ReceivedTitle { .. } => ReplyKind::Void,
            Self::ShowFileChooser => ReplyKind::Strings,
            Self::JsConfirm { .. } => ReplyKind::Bool,
        }
    }
}

/// One event fired by a host object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    /// Handle of the object the event fired on.
    pub source: Handle,
    /// Handles of the object arguments, in parameter order.
    pub arguments: Vec<Handle>,
    pub payload: EventPayload,
}

/// Messages sent from the host to the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "snake_case")]
pub enum RemoteMessage {
    /// The remote should create a proxy for a host-created instance.
    Create {
        handle: Handle,
        descriptor: InstanceDescriptor,
    },
    Event(EventMessage),
}

impl RemoteMessage {
    /// Handle the message is about: the new instance for `Create`, the
    /// emitting object for `Event`.
    pub fn subject(&self) -> Handle {
        match self {
            Self::Create { handle, .. } => *handle,
            Self::Event(event) => event.source,
        }
    }
}

/// Shape of a remote reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Void,
    Bool,
    Strings,
}

/// A reply from the remote side. Every call gets exactly one, possibly `Void`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reply", content = "value", rename_all = "snake_case")]
pub enum ReplyValue {
    Void,
    Bool(bool),
    Strings(Vec<String>),
}

impl ReplyValue {
    pub fn kind(&self) -> ReplyKind {
        match self {
            Self::Void => ReplyKind::Void,
            Self::Bool(_) => ReplyKind::Bool,
            Self::Strings(_) => ReplyKind::Strings,
        }
    }

    pub fn into_bool(self) -> Result<bool> {
        match self {
            Self::Bool(value) => Ok(value),
            other => Err(BridgeError::UnexpectedReply {
                expected: ReplyKind::Bool,
                actual: other.kind(),
            }),
        }
    }

    pub fn into_strings(self) -> Result<Vec<String>> {
        match self {
            Self::Strings(values) => Ok(values),
            other => Err(BridgeError::UnexpectedReply {
                expected: ReplyKind::Strings,
                actual: other.kind(),
            }),
        }
    }
}
