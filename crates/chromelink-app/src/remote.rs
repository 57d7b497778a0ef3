// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process stand-in for the remote side: answers every message with a
// canned reply and keeps a timestamped transcript of what it saw.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};
use uuid::Uuid;

use chromelink_core::error::Result;
use chromelink_core::types::{EventPayload, RemoteMessage, ReplyValue};
use chromelink_messaging::Envelope;

/// One message as the remote side observed it.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub session: Uuid,
    pub call: u64,
    pub received_at: DateTime<Utc>,
    pub message: RemoteMessage,
    pub reply: ReplyValue,
}

pub struct SimulatedRemote {
    session: Uuid,
    picked_files: Vec<String>,
    confirm: bool,
}

impl SimulatedRemote {
    pub fn new(session: Uuid) -> Self {
        Self {
            session,
            picked_files: vec!["content://media/external/images/1".into()],
            confirm: true,
        }
    }

    pub fn reply_for(&self, message: &RemoteMessage) -> ReplyValue {
        match message {
            RemoteMessage::Create { .. } => ReplyValue::Void,
            RemoteMessage::Event(event) => match &event.payload {
                EventPayload::ShowFileChooser => ReplyValue::Strings(self.picked_files.clone()),
                EventPayload::JsConfirm { .. } => ReplyValue::Bool(self.confirm),
                EventPayload::ProgressChanged { .. } | EventPayload::ReceivedTitle { .. } => {
                    ReplyValue::Void
                }
            },
        }
    }

    /// Serve until every sender of the channel is gone.
    pub async fn run(self, mut receiver: UnboundedReceiver<Envelope>) -> Vec<TranscriptEntry> {
        let mut transcript = Vec::new();
        while let Some(envelope) = receiver.recv().await {
            let reply = self.reply_for(&envelope.message);
            debug!(call = envelope.call.0, subject = %envelope.message.subject(), "remote received");
            transcript.push(TranscriptEntry {
                session: self.session,
                call: envelope.call.0,
                received_at: Utc::now(),
                message: envelope.message.clone(),
                reply: reply.clone(),
            });
            envelope.reply(reply);
        }
        info!(messages = transcript.len(), "remote channel closed");
        transcript
    }
}

/// Write the transcript as JSON lines.
pub fn write_transcript<W: Write>(entries: &[TranscriptEntry], mut out: W) -> Result<()> {
    for entry in entries {
        serde_json::to_writer(&mut out, entry)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
