//! Frame routing: dispatch decoded stream events to store mutations.
//!
//! All routing state is keyed by `chat_uuid`, never globally, so frames for
//! different chats interleave without contaminating each other. One bad
//! frame never corrupts processing of the frames around it.
//!
//! The `end_partial_message` → `new_message` pair is treated as a two-phase
//! commit: `end` marks the generation finished but leaves the accumulator in
//! place (clearing it early makes the message visibly flash out before the
//! persisted copy arrives); the accumulator is removed only once the
//! persisted message has been folded into the cache, or after a bounded
//! timeout if the persisted copy never shows up.

use std::time::Instant;

use tracing::{debug, warn};

use crate::state::ClientState;
use crate::websocket::{decode_frame, StreamEvent};

impl ClientState {
    /// Decode and apply a raw text frame. Malformed frames are dropped and
    /// logged; unknown frame types are ignored without effect.
    pub fn apply_raw_frame(&mut self, raw: &str) {
        match decode_frame(raw) {
            Ok(event) => self.apply_event(event),
            Err(e) => warn!("Dropping malformed frame: {}", e),
        }
    }

    /// Apply one decoded stream event.
    pub fn apply_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::StartPartialMessage(content) => {
                debug!(chat = %content.chat_uuid, "Generation started");
                // A fresh start supersedes any stale pending handoff for
                // the chat along with prior accumulator residue.
                self.pending_handoffs.remove(&content.chat_uuid);
                self.partials.start(&content.chat_uuid);
            }
            StreamEvent::NewPartialMessage(content) => {
                let chat_uuid = content.chat_uuid.clone();
                self.partials.append(&chat_uuid, content.into_delta());
            }
            StreamEvent::EndPartialMessage(content) => {
                debug!(chat = %content.chat_uuid, "Generation finished, awaiting persisted copy");
                self.pending_handoffs
                    .insert(content.chat_uuid, Instant::now());
            }
            StreamEvent::NewMessage(content) => {
                let chat_uuid = content.chat_uuid.clone();
                match content.into_message() {
                    Some(message) => {
                        self.cache.reconcile(&chat_uuid, message);
                        // Handoff complete; only now may the accumulator go.
                        self.partials.remove(&chat_uuid);
                        self.pending_handoffs.remove(&chat_uuid);
                    }
                    None => warn!(chat = %chat_uuid, "Dropping new_message without uuid"),
                }
            }
            StreamEvent::Unknown => {
                debug!("Ignoring unhandled frame type");
            }
        }
    }

    /// Clear accumulators whose `end_partial_message` was never followed by
    /// a `new_message` within the handoff timeout. Called periodically by
    /// the event loop.
    pub fn expire_stale_handoffs(&mut self, now: Instant) {
        let timeout = self.handoff_timeout;
        let expired: Vec<String> = self
            .pending_handoffs
            .iter()
            .filter(|(_, ended_at)| now.duration_since(**ended_at) >= timeout)
            .map(|(chat, _)| chat.clone())
            .collect();

        for chat_uuid in expired {
            warn!(chat = %chat_uuid, "No persisted copy arrived in time, clearing accumulator");
            self.pending_handoffs.remove(&chat_uuid);
            self.partials.remove(&chat_uuid);
        }
    }
}
