// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outbound event forwarder.
//
// Turns one host callback into a causally ordered series of messages:
//
//   1. every object argument is resolved, or weakly registered and announced
//      with a `create` message if the remote side has never seen it;
//   2. the event source is resolved strongly (it must already be registered);
//   3. the event message is queued on the messenger;
//   4. callers that need a synchronous answer block on the reply token.
//
// Steps 1–3 run under one lock, so events reach the messenger in the order
// their callbacks entered the forwarder and an argument's `create` message
// always precedes the first event that names it.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, instrument};

use chromelink_core::config::BridgeConfig;
use chromelink_core::error::Result;
use chromelink_core::types::{EventMessage, EventPayload, Handle, RemoteMessage, ReplyValue};
use chromelink_registry::{HostObject, InstanceRegistry};

use crate::announcer::CreationAnnouncer;
use crate::messenger::{Messenger, ReplyCallback};
use crate::reply::PendingReply;

/// An object passed as an argument of a forwarded event.
pub trait EventArgument {
    /// Handle of the argument, registering it weakly if it is new.
    fn discover(&self, registry: &InstanceRegistry) -> Result<Handle>;
}

impl<O: HostObject + ?Sized> EventArgument for Arc<O> {
    fn discover(&self, registry: &InstanceRegistry) -> Result<Handle> {
        registry.resolve_or_register_weak(self)
    }
}

/// Forwards host events to the remote side.
pub struct EventForwarder {
    registry: Arc<InstanceRegistry>,
    messenger: Arc<dyn Messenger>,
    send_order: Mutex<()>,
}

impl EventForwarder {
    pub fn new(registry: Arc<InstanceRegistry>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            registry,
            messenger,
            send_order: Mutex::new(()),
        }
    }

    /// Build a registry that announces discovered instances over
    /// `messenger`, and a forwarder sending events over the same messenger.
    pub fn connect(config: &BridgeConfig, messenger: Arc<dyn Messenger>) -> Self {
        let announcer = Arc::new(CreationAnnouncer::new(Arc::clone(&messenger)));
        let registry = Arc::new(InstanceRegistry::from_config(config).with_observer(announcer));
        Self::new(registry, messenger)
    }

    pub fn registry(&self) -> &Arc<InstanceRegistry> {
        &self.registry
    }

    /// Queue an event and hand its reply to `reply`.
    #[instrument(skip_all, fields(method = payload.method_name()))]
    pub fn dispatch<S: HostObject + ?Sized>(
        &self,
        source: &Arc<S>,
        arguments: &[&dyn EventArgument],
        payload: EventPayload,
        reply: ReplyCallback,
    ) -> Result<()> {
        let _order = self.send_order.lock().unwrap_or_else(PoisonError::into_inner);

        let argument_handles = arguments
            .iter()
            .map(|argument| argument.discover(&self.registry))
            .collect::<Result<Vec<_>>>()?;

        let source_handle = self.registry.resolve_strong(source).inspect_err(|e| {
            error!(error = %e, "event source was never registered");
        })?;

        debug!(source = %source_handle, arguments = ?argument_handles, "forwarding event");
        self.messenger.send(
            RemoteMessage::Event(EventMessage {
                source: source_handle,
                arguments: argument_handles,
                payload,
            }),
            reply,
        )
    }

    /// Queue an event and return a token for its reply. Does not block.
    pub fn forward<S: HostObject + ?Sized>(
        &self,
        source: &Arc<S>,
        arguments: &[&dyn EventArgument],
        payload: EventPayload,
    ) -> Result<PendingReply> {
        let (callback, pending) = PendingReply::channel(payload.reply_kind());
        self.dispatch(source, arguments, payload, callback)?;
        Ok(pending)
    }

    /// Queue an event and block the calling thread until the remote side
    /// replies. There is no timeout.
    pub fn forward_and_wait<S: HostObject + ?Sized>(
        &self,
        source: &Arc<S>,
        arguments: &[&dyn EventArgument],
        payload: EventPayload,
    ) -> Result<ReplyValue> {
        self.forward(source, arguments, payload)?.wait()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messenger::{ChannelMessenger, Envelope};
    use chromelink_core::error::BridgeError;
    use chromelink_core::types::{InstanceDescriptor, InstanceKind};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Client;

    impl HostObject for Client {
        fn describe(&self) -> InstanceDescriptor {
            InstanceDescriptor::ChromeClient
        }
    }

    struct View;

    impl HostObject for View {
        fn describe(&self) -> InstanceDescriptor {
            InstanceDescriptor::WebView
        }
    }

    fn setup() -> (EventForwarder, UnboundedReceiver<Envelope>) {
        let (messenger, receiver) = ChannelMessenger::new();
        let forwarder = EventForwarder::connect(&BridgeConfig::default(), Arc::new(messenger));
        (forwarder, receiver)
    }

    fn drain(receiver: &mut UnboundedReceiver<Envelope>) -> Vec<RemoteMessage> {
        let mut messages = Vec::new();
        while let Ok(envelope) = receiver.try_recv() {
            messages.push(envelope.message);
        }
        messages
    }

    #[test]
    fn unknown_argument_is_announced_before_event() {
        let (forwarder, mut receiver) = setup();
        let client = Arc::new(Client);
        forwarder
            .registry()
            .register_remote_created(&client, Handle(1))
            .expect("register client");
        let view = Arc::new(View);

        forwarder
            .forward(&client, &[&view], EventPayload::ProgressChanged { progress: 40 })
            .expect("forward");

        let messages = drain(&mut receiver);
        assert_eq!(messages.len(), 2);
        let RemoteMessage::Create { handle, descriptor } = &messages[0] else {
            panic!("expected create first, got {:?}", messages[0]);
        };
        assert_eq!(descriptor.kind(), InstanceKind::WebView);
        assert_eq!(
            messages[1],
            RemoteMessage::Event(EventMessage {
                source: Handle(1),
                arguments: vec![*handle],
                payload: EventPayload::ProgressChanged { progress: 40 },
            })
        );
    }

    #[test]
    fn known_argument_is_not_announced_again() {
        let (forwarder, mut receiver) = setup();
        let client = Arc::new(Client);
        forwarder
            .registry()
            .register_remote_created(&client, Handle(1))
            .expect("register client");
        let view = Arc::new(View);

        for progress in [10, 20] {
            forwarder
                .forward(&client, &[&view], EventPayload::ProgressChanged { progress })
                .expect("forward");
        }

        let creates = drain(&mut receiver)
            .into_iter()
            .filter(|m| matches!(m, RemoteMessage::Create { .. }))
            .count();
        assert_eq!(creates, 1);
    }

    #[test]
    fn unregistered_source_sends_no_event() {
        let (forwarder, mut receiver) = setup();
        let client = Arc::new(Client);
        let view = Arc::new(View);

        let err = forwarder
            .forward(&client, &[&view], EventPayload::ReceivedTitle { title: "t".into() })
            .expect_err("unregistered source");

        assert!(matches!(err, BridgeError::UnregisteredInstance { .. }));
        assert!(
            drain(&mut receiver)
                .iter()
                .all(|m| !matches!(m, RemoteMessage::Event(_)))
        );
    }

    /// Fails the first send, then behaves like the channel it wraps.
    struct FirstSendFails {
        inner: ChannelMessenger,
        failed: AtomicBool,
    }

    impl Messenger for FirstSendFails {
        fn send(&self, message: RemoteMessage, reply: ReplyCallback) -> Result<()> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(BridgeError::Messenger("remote unreachable".into()));
            }
            self.inner.send(message, reply)
        }
    }

    #[test]
    fn failed_announcement_stops_the_event() {
        let (inner, mut receiver) = ChannelMessenger::new();
        let forwarder = EventForwarder::connect(
            &BridgeConfig::default(),
            Arc::new(FirstSendFails {
                inner,
                failed: AtomicBool::new(false),
            }),
        );
        let client = Arc::new(Client);
        forwarder
            .registry()
            .register_remote_created(&client, Handle(1))
            .expect("register client");
        let view = Arc::new(View);

        let err = forwarder
            .forward(&client, &[&view], EventPayload::ProgressChanged { progress: 1 })
            .expect_err("announcement fails");
        assert!(matches!(err, BridgeError::Messenger(_)));
        assert!(drain(&mut receiver).is_empty());

        forwarder
            .forward(&client, &[&view], EventPayload::ProgressChanged { progress: 2 })
            .expect("retry");
        let messages = drain(&mut receiver);
        assert_eq!(messages.len(), 2);
        let RemoteMessage::Create { handle, .. } = &messages[0] else {
            panic!("expected create first, got {:?}", messages[0]);
        };
        let RemoteMessage::Event(event) = &messages[1] else {
            panic!("expected event second, got {:?}", messages[1]);
        };
        assert_eq!(event.arguments, vec![*handle]);
    }

    #[test]
    fn forward_and_wait_blocks_for_reply() {
        let (forwarder, mut receiver) = setup();
        let client = Arc::new(Client);
        forwarder
            .registry()
            .register_remote_created(&client, Handle(1))
            .expect("register client");

        let remote = std::thread::spawn(move || {
            let envelope = receiver.blocking_recv().expect("event envelope");
            assert!(matches!(envelope.message, RemoteMessage::Event(_)));
            envelope.reply(ReplyValue::Bool(true));
        });

        let reply = forwarder
            .forward_and_wait(
                &client,
                &[],
                EventPayload::JsConfirm {
                    url: "https://example.org".into(),
                    message: "Leave page?".into(),
                },
            )
            .expect("reply");
        assert_eq!(reply, ReplyValue::Bool(true));
        remote.join().expect("remote thread");
    }

    #[test]
    fn per_source_order_survives_concurrent_traffic() {
        let (forwarder, mut receiver) = setup();
        let forwarder = Arc::new(forwarder);
        let watched = Arc::new(Client);
        forwarder
            .registry()
            .register_remote_created(&watched, Handle(1))
            .expect("register watched");
        let view = Arc::new(View);

        let noise: Vec<_> = (0..100u64)
            .map(|i| {
                let forwarder = Arc::clone(&forwarder);
                let view = Arc::clone(&view);
                std::thread::spawn(move || {
                    let other = Arc::new(Client);
                    forwarder
                        .registry()
                        .register_remote_created(&other, Handle(1_000 + i))
                        .expect("register other");
                    forwarder
                        .forward(&other, &[&view], EventPayload::ProgressChanged { progress: 1 })
                        .expect("noise forward");
                })
            })
            .collect();

        forwarder
            .forward(&watched, &[&view], EventPayload::ProgressChanged { progress: 100 })
            .expect("progress");
        forwarder
            .forward(&watched, &[&view], EventPayload::ReceivedTitle { title: "Done".into() })
            .expect("title");

        for thread in noise {
            thread.join().expect("noise thread");
        }

        let watched_events: Vec<_> = drain(&mut receiver)
            .into_iter()
            .filter_map(|m| match m {
                RemoteMessage::Event(event) if event.source == Handle(1) => Some(event.payload),
                _ => None,
            })
            .collect();
        assert_eq!(
            watched_events,
            vec![
                EventPayload::ProgressChanged { progress: 100 },
                EventPayload::ReceivedTitle { title: "Done".into() },
            ]
        );
    }
}
