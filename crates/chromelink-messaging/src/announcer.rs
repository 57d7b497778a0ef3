// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Announces weakly discovered instances to the remote side.

use std::sync::Arc;

use tracing::{debug, warn};

use chromelink_core::error::Result;
use chromelink_core::types::{Handle, InstanceDescriptor, RemoteMessage};
use chromelink_registry::InstanceObserver;

use crate::messenger::Messenger;

/// Sends a `create` message for every instance the registry discovers.
///
/// The announcement uses the same message shape as a remote-initiated
/// create; the remote's reply is empty and ignored.
pub struct CreationAnnouncer {
    messenger: Arc<dyn Messenger>,
}

impl CreationAnnouncer {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }
}

impl InstanceObserver for CreationAnnouncer {
    fn instance_discovered(&self, handle: Handle, descriptor: &InstanceDescriptor) -> Result<()> {
        let message = RemoteMessage::Create {
            handle,
            descriptor: descriptor.clone(),
        };
        self.messenger
            .send(message, Box::new(|_| {}))
            .inspect_err(|e| warn!(%handle, error = %e, "failed to announce instance"))?;
        debug!(%handle, kind = ?descriptor.kind(), "announced instance");
        Ok(())
    }
}
