// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Chromelink.

use thiserror::Error;

use crate::types::{Handle, ReplyKind};

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Identifier registry --
    /// No live entry for the handle or object. `handle` is `None` when the
    /// lookup was by object identity.
    #[error("{}", unregistered_message(.handle))]
    UnregisteredInstance { handle: Option<Handle> },

    #[error("handle {0} is already held by a different live instance")]
    DuplicateHandle(Handle),

    #[error("identifier registry has been closed")]
    RegistryClosed,

    // -- Window-open gate --
    #[error("window open requested without a navigation policy delegate")]
    PolicyDelegateMissing,

    // -- Remote round trips --
    #[error("reply channel closed before the remote side answered")]
    ReplyChannelClosed,

    #[error("unexpected reply: expected {expected:?}, got {actual:?}")]
    UnexpectedReply { expected: ReplyKind, actual: ReplyKind },

    #[error("messenger error: {0}")]
    Messenger(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn unregistered_message(handle: &Option<Handle>) -> String {
    match handle {
        Some(h) => format!("no live instance registered for handle {h}"),
        None => "instance has no live registry entry".to_string(),
    }
}

impl BridgeError {
    /// Shorthand for an identity lookup that found nothing.
    pub fn unregistered_object() -> Self {
        Self::UnregisteredInstance { handle: None }
    }

    /// Shorthand for a handle lookup that found nothing.
    pub fn unregistered_handle(handle: Handle) -> Self {
        Self::UnregisteredInstance {
            handle: Some(handle),
        }
    }

    /// Whether the error signals an internal wiring defect rather than a
    /// runtime condition the host can recover from.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::UnregisteredInstance { .. } | Self::UnexpectedReply { .. }
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;
