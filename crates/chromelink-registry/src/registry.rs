// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Identifier registry.
//
// Entries live in an arena keyed by handle. A reverse index keyed by the
// address of the object's `Arc` allocation answers "which handle does this
// object have". Every entry holds either a strong `Arc` or a `Weak`, and a
// `Weak` keeps the allocation reserved, so an address in the index can never
// be reused by a different object while the entry exists.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tracing::{debug, info, instrument, warn};

use chromelink_core::config::BridgeConfig;
use chromelink_core::error::{BridgeError, Result};
use chromelink_core::types::{Handle, InstanceKind, Ownership};

use crate::object::{HostObject, InstanceObserver};

type AnyArc = Arc<dyn Any + Send + Sync>;
type AnyWeak = Weak<dyn Any + Send + Sync>;

/// Address of the allocation behind an `Arc`, used as object identity.
fn identity_of<O: ?Sized>(object: &Arc<O>) -> usize {
    Arc::as_ptr(object) as *const () as usize
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

enum Reference {
    Strong(AnyArc),
    Weak(AnyWeak),
}

struct Entry {
    reference: Reference,
    kind: InstanceKind,
    identity: usize,
}

impl Entry {
    fn strong(object: AnyArc, kind: InstanceKind, identity: usize) -> Self {
        Self {
            reference: Reference::Strong(object),
            kind,
            identity,
        }
    }

    fn weak(object: &AnyArc, kind: InstanceKind, identity: usize) -> Self {
        Self {
            reference: Reference::Weak(Arc::downgrade(object)),
            kind,
            identity,
        }
    }

    fn upgrade(&self) -> Option<AnyArc> {
        match &self.reference {
            Reference::Strong(object) => Some(Arc::clone(object)),
            Reference::Weak(object) => object.upgrade(),
        }
    }

    fn is_live(&self) -> bool {
        match &self.reference {
            Reference::Strong(_) => true,
            Reference::Weak(object) => object.strong_count() > 0,
        }
    }

    fn ownership(&self) -> Ownership {
        match self.reference {
            Reference::Strong(_) => Ownership::Strong,
            Reference::Weak(_) => Ownership::Weak,
        }
    }

    fn demote(&mut self) {
        let weak = match &self.reference {
            Reference::Strong(object) => Arc::downgrade(object),
            Reference::Weak(_) => return,
        };
        self.reference = Reference::Weak(weak);
    }

    /// Returns false if the object is already gone.
    fn promote(&mut self) -> bool {
        let upgraded = match &self.reference {
            Reference::Strong(_) => return true,
            Reference::Weak(object) => object.upgrade(),
        };
        match upgraded {
            Some(strong) => {
                self.reference = Reference::Strong(strong);
                true
            }
            None => false,
        }
    }
}

#[derive(Default)]
struct State {
    entries: HashMap<Handle, Entry>,
    identities: HashMap<usize, Handle>,
    /// Objects whose handle the remote side disposed of. They are not
    /// silently re-announced by weak discovery.
    released: HashMap<usize, AnyWeak>,
    closed: bool,
}

impl State {
    fn live_handle_for(&self, identity: usize) -> Option<Handle> {
        let handle = *self.identities.get(&identity)?;
        let entry = self.entries.get(&handle)?;
        (entry.identity == identity && entry.is_live()).then_some(handle)
    }

    fn newest_live_handle_for(&self, identity: usize) -> Option<Handle> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.identity == identity && entry.is_live())
            .map(|(handle, _)| *handle)
            .max()
    }

    fn is_released(&self, identity: usize) -> bool {
        self.released
            .get(&identity)
            .is_some_and(|object| object.strong_count() > 0)
    }

    fn insert(&mut self, handle: Handle, entry: Entry) {
        self.released.remove(&entry.identity);
        self.identities.insert(entry.identity, handle);
        self.entries.insert(handle, entry);
    }

    fn remove_entry(&mut self, handle: Handle) -> Option<Entry> {
        let entry = self.entries.remove(&handle)?;
        if self.identities.get(&entry.identity) == Some(&handle) {
            self.identities.remove(&entry.identity);
        }
        Some(entry)
    }

    /// Demote every entry for `identity` except `keep`.
    fn demote_others(&mut self, identity: usize, keep: Handle) {
        for (handle, entry) in self.entries.iter_mut() {
            if *handle != keep && entry.identity == identity {
                entry.demote();
            }
        }
    }

    /// Keep at most one strong entry per object: an existing strong entry
    /// for `identity` becomes weak before a new strong one is inserted.
    fn demote_existing(&mut self, identity: usize) {
        if let Some(previous) = self.live_handle_for(identity) {
            if let Some(entry) = self.entries.get_mut(&previous) {
                entry.demote();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps host instances to the integer handles the remote side uses.
///
/// Shared by every callback thread. Mutations take the write lock; lookups
/// take the read lock and run concurrently.
pub struct InstanceRegistry {
    state: RwLock<State>,
    next_handle: AtomicU64,
    observer: Option<Arc<dyn InstanceObserver>>,
}

impl InstanceRegistry {
    /// Create a registry whose host-allocated handles start at
    /// `first_host_handle`.
    pub fn new(first_host_handle: u64) -> Self {
        Self {
            state: RwLock::new(State::default()),
            next_handle: AtomicU64::new(first_host_handle),
            observer: None,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.first_host_handle)
    }

    /// Attach the observer told about weakly discovered instances.
    pub fn with_observer(mut self, observer: Arc<dyn InstanceObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Must be called with the write lock held.
    fn allocate(&self, state: &State) -> Handle {
        loop {
            let candidate = Handle(self.next_handle.fetch_add(1, Ordering::SeqCst));
            if !state.entries.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Register an instance the host created on its own. Always allocates a
    /// fresh handle, even if the object is already registered; the older
    /// entry is kept but no longer owns the object.
    #[instrument(skip_all)]
    pub fn register_host_created<O: HostObject + ?Sized>(&self, object: &Arc<O>) -> Result<Handle> {
        let kind = object.describe().kind();
        let identity = identity_of(object);

        let mut state = self.write();
        if state.closed {
            return Err(BridgeError::RegistryClosed);
        }
        let handle = self.allocate(&state);
        state.demote_existing(identity);
        state.insert(
            handle,
            Entry::strong(Arc::clone(object).into_any_arc(), kind, identity),
        );

        debug!(%handle, ?kind, "registered host-created instance");
        Ok(handle)
    }

    /// Register an instance created at the remote side's request, under the
    /// handle the remote side chose.
    #[instrument(skip(self, object))]
    pub fn register_remote_created<O: HostObject + ?Sized>(
        &self,
        object: &Arc<O>,
        handle: Handle,
    ) -> Result<()> {
        let kind = object.describe().kind();
        let identity = identity_of(object);

        let mut state = self.write();
        if state.closed {
            return Err(BridgeError::RegistryClosed);
        }

        let existing = state
            .entries
            .get(&handle)
            .filter(|entry| entry.is_live())
            .map(|entry| (entry.identity, entry.ownership()));
        if let Some((existing_identity, ownership)) = existing {
            if existing_identity != identity {
                warn!(%handle, "remote reused a live handle");
                return Err(BridgeError::DuplicateHandle(handle));
            }
            // At most one strong entry per object.
            if ownership == Ownership::Weak {
                state.demote_others(identity, handle);
                if let Some(entry) = state.entries.get_mut(&handle) {
                    entry.promote();
                }
            }
            state.identities.insert(identity, handle);
            return Ok(());
        }
        // Whatever is left under `handle` is a stale weak entry.
        let stale = state.remove_entry(handle);

        state.demote_existing(identity);
        state.insert(
            handle,
            Entry::strong(Arc::clone(object).into_any_arc(), kind, identity),
        );
        drop(state);
        drop(stale);

        debug!(%handle, ?kind, "registered remote-created instance");
        Ok(())
    }

    /// Handle of an object that must already be registered.
    ///
    /// A weak entry is promoted to strong: an object that is the source of a
    /// forwarded event stays alive for as long as the remote holds its handle.
    pub fn resolve_strong<O: HostObject + ?Sized>(&self, object: &Arc<O>) -> Result<Handle> {
        let identity = identity_of(object);
        {
            let state = self.read();
            let handle = state
                .live_handle_for(identity)
                .ok_or_else(BridgeError::unregistered_object)?;
            if state
                .entries
                .get(&handle)
                .is_some_and(|entry| entry.ownership() == Ownership::Strong)
            {
                return Ok(handle);
            }
        }

        let mut state = self.write();
        let handle = state
            .live_handle_for(identity)
            .ok_or_else(BridgeError::unregistered_object)?;
        match state.entries.get_mut(&handle).map(Entry::promote) {
            Some(true) => {
                debug!(%handle, "promoted weak entry to strong");
                Ok(handle)
            }
            _ => Err(BridgeError::unregistered_handle(handle)),
        }
    }

    /// Handle of `object`, registering it weakly (and announcing it to the
    /// observer) if it has never been seen.
    pub fn resolve_or_register_weak<O: HostObject + ?Sized>(
        &self,
        object: &Arc<O>,
    ) -> Result<Handle> {
        let identity = identity_of(object);
        if let Some(handle) = self.read().live_handle_for(identity) {
            return Ok(handle);
        }

        let mut state = self.write();
        if state.closed {
            return Err(BridgeError::RegistryClosed);
        }
        // Another thread may have registered it between the two locks.
        if let Some(handle) = state.live_handle_for(identity) {
            return Ok(handle);
        }
        if state.is_released(identity) {
            warn!("weak lookup of an instance whose handle was released");
            return Err(BridgeError::unregistered_object());
        }

        let descriptor = object.describe();
        let handle = self.allocate(&state);
        let erased = Arc::clone(object).into_any_arc();
        state.insert(handle, Entry::weak(&erased, descriptor.kind(), identity));

        if let Some(observer) = &self.observer {
            if let Err(e) = observer.instance_discovered(handle, &descriptor) {
                state.remove_entry(handle);
                warn!(%handle, error = %e, "announcement failed; weak registration undone");
                return Err(e);
            }
        }
        debug!(%handle, kind = ?descriptor.kind(), "weakly registered host instance");
        Ok(handle)
    }

    /// Remove the entry for `handle`, whatever its ownership. Returns false
    /// if there was no entry.
    #[instrument(skip(self))]
    pub fn release(&self, handle: Handle) -> bool {
        let mut state = self.write();
        let Some(entry) = state.remove_entry(handle) else {
            debug!("release of unknown handle ignored");
            return false;
        };

        let identity = entry.identity;
        if let Some(other) = state.newest_live_handle_for(identity) {
            state.identities.insert(identity, other);
        } else if let Some(object) = entry.upgrade() {
            state.released.insert(identity, Arc::downgrade(&object));
        }
        drop(state);

        debug!(ownership = ?entry.ownership(), "released instance");
        drop(entry);
        true
    }

    /// Plain lookup by handle. Never registers anything.
    ///
    /// A handle that is unknown, stale, or holds a different type reads as
    /// unregistered.
    pub fn get<T: HostObject>(&self, handle: Handle) -> Result<Arc<T>> {
        let object = self
            .read()
            .entries
            .get(&handle)
            .and_then(Entry::upgrade)
            .ok_or_else(|| BridgeError::unregistered_handle(handle))?;

        object.downcast::<T>().map_err(|_| {
            warn!(%handle, expected = type_name::<T>(), "handle refers to a different kind");
            BridgeError::unregistered_handle(handle)
        })
    }

    /// Whether `handle` has a live entry.
    pub fn contains(&self, handle: Handle) -> bool {
        self.read()
            .entries
            .get(&handle)
            .is_some_and(Entry::is_live)
    }

    pub fn kind_of(&self, handle: Handle) -> Option<InstanceKind> {
        self.read()
            .entries
            .get(&handle)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.kind)
    }

    pub fn ownership_of(&self, handle: Handle) -> Option<Ownership> {
        self.read()
            .entries
            .get(&handle)
            .filter(|entry| entry.is_live())
            .map(Entry::ownership)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.read().entries.values().filter(|e| e.is_live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop weak entries whose object is gone. Lookups already treat them as
    /// missing; this only reclaims the slots. Returns the pruned handles.
    pub fn prune_stale(&self) -> Vec<Handle> {
        let mut state = self.write();
        let mut stale: Vec<Handle> = state
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_live())
            .map(|(handle, _)| *handle)
            .collect();
        stale.sort_unstable();

        for handle in &stale {
            state.remove_entry(*handle);
        }
        state.released.retain(|_, object| object.strong_count() > 0);

        if !stale.is_empty() {
            debug!(count = stale.len(), "pruned stale weak entries");
        }
        stale
    }

    /// Tear the registry down. Every entry is dropped and no later lookup or
    /// registration succeeds.
    pub fn close(&self) {
        let mut state = self.write();
        state.closed = true;
        let entries = std::mem::take(&mut state.entries);
        state.identities.clear();
        state.released.clear();
        drop(state);

        info!(dropped = entries.len(), "identifier registry closed");
        drop(entries);
    }

    pub fn is_closed(&self) -> bool {
        self.read().closed
    }
}
