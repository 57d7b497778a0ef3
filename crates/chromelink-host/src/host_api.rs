// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host-object factory: the remote side's entry points for creating and
// configuring chrome clients by handle.

use std::sync::Arc;

use tracing::{info, instrument};

use chromelink_core::config::BridgeConfig;
use chromelink_core::error::Result;
use chromelink_core::types::Handle;
use chromelink_messaging::ChromeClientEvents;
use chromelink_registry::InstanceRegistry;

use crate::chrome_client::ChromeClient;
use crate::navigation::NavigationShape;
use crate::traits::{FullscreenHost, NavigationPolicy, ProbeFactory};
use crate::window_gate::WindowOpenGate;

/// Builds chrome clients with the host capabilities they need.
pub struct ChromeClientCreator {
    probes: Arc<dyn ProbeFactory>,
    fullscreen: Option<Arc<dyn FullscreenHost>>,
    shape: NavigationShape,
    file_chooser_default: bool,
}

impl ChromeClientCreator {
    pub fn new(config: &BridgeConfig, probes: Arc<dyn ProbeFactory>) -> Self {
        Self {
            probes,
            fullscreen: None,
            shape: NavigationShape::from_config(config),
            file_chooser_default: config.file_chooser_default_return,
        }
    }

    pub fn with_fullscreen(mut self, host: Arc<dyn FullscreenHost>) -> Self {
        self.fullscreen = Some(host);
        self
    }

    pub fn create(&self, events: Arc<ChromeClientEvents>) -> ChromeClient {
        ChromeClient::new(
            events,
            WindowOpenGate::new(Arc::clone(&self.probes), self.shape),
            self.fullscreen.clone(),
            self.file_chooser_default,
        )
    }
}

pub struct ChromeClientHostApi {
    registry: Arc<InstanceRegistry>,
    events: Arc<ChromeClientEvents>,
    creator: ChromeClientCreator,
}

impl ChromeClientHostApi {
    pub fn new(events: Arc<ChromeClientEvents>, creator: ChromeClientCreator) -> Self {
        Self {
            registry: Arc::clone(events.forwarder().registry()),
            events,
            creator,
        }
    }

    pub fn registry(&self) -> &Arc<InstanceRegistry> {
        &self.registry
    }

    /// Create a chrome client under the remote-chosen `handle`.
    #[instrument(skip(self))]
    pub fn create(&self, handle: Handle) -> Result<Arc<ChromeClient>> {
        let client = Arc::new(self.creator.create(Arc::clone(&self.events)));
        self.registry.register_remote_created(&client, handle)?;
        info!(%handle, "chrome client created");
        Ok(client)
    }

    #[instrument(skip(self))]
    pub fn set_synchronous_return_value_for_on_show_file_chooser(
        &self,
        handle: Handle,
        value: bool,
    ) -> Result<()> {
        self.registry
            .get::<ChromeClient>(handle)?
            .set_return_value_for_file_chooser(value);
        Ok(())
    }

    #[instrument(skip(self, policy))]
    pub fn set_navigation_policy(
        &self,
        handle: Handle,
        policy: Arc<dyn NavigationPolicy>,
    ) -> Result<()> {
        self.registry
            .get::<ChromeClient>(handle)?
            .set_navigation_policy(policy);
        Ok(())
    }

    /// The remote side no longer uses `handle`.
    pub fn dispose(&self, handle: Handle) -> bool {
        self.registry.release(handle)
    }
}
