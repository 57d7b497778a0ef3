// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Traits for objects that can be stored in the registry, and for observers
// of newly discovered instances.

use std::any::Any;
use std::sync::Arc;

use chromelink_core::error::Result;
use chromelink_core::types::{Handle, InstanceDescriptor};

/// Converts an `Arc` of any concrete or trait-object type into a type-erased
/// `Arc<dyn Any>` pointing at the same allocation.
pub trait AsAnyArc {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A host-side object that can be referred to by handle.
///
/// Identity is the `Arc` allocation, never the value: two equal objects in
/// different allocations are different instances.
pub trait HostObject: AsAnyArc + Send + Sync + 'static {
    /// Descriptor announced to the remote side when the host discovers the
    /// instance on its own.
    fn describe(&self) -> InstanceDescriptor;
}

/// Receives a callback when the registry weakly registers an instance the
/// remote side has never seen.
///
/// Called while the registry's write lock is held so that no other thread can
/// reference the new handle before the announcement is made. Implementations
/// must not block and must not call back into the registry. An error undoes
/// the registration.
pub trait InstanceObserver: Send + Sync {
    fn instance_discovered(&self, handle: Handle, descriptor: &InstanceDescriptor) -> Result<()>;
}
