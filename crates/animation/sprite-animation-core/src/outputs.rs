//! Semantic events recorded by the handler while ticking.
//!
//! The frame image is the per-tick output; events describe what happened to the
//! playback state so game code can react (sounds, hitboxes, state changes).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Why a sequence became the current one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartSource {
    /// Popped from the front of the queue.
    Queue,
    /// Queue was empty; fell back to the default entry.
    Default,
    /// Switched immediately via `play_now`.
    Immediate,
}

/// Discrete playback signals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum HandlerEvent {
    SequenceWrapped {
        name: String,
    },
    SequenceStarted {
        name: String,
        scale: u32,
        source: StartSource,
    },
    HoldStarted {
        frames: u32,
    },
    HoldReleased {
        name: String,
    },
}

/// Bounded FIFO of pending events.
#[derive(Debug, Default)]
pub(crate) struct EventLog {
    events: VecDeque<HandlerEvent>,
}

impl EventLog {
    pub(crate) fn push(&mut self, event: HandlerEvent, capacity: usize) {
        if capacity == 0 {
            return;
        }
        while self.events.len() >= capacity {
            if let Some(dropped) = self.events.pop_front() {
                log::warn!("event log full ({capacity}); dropping {dropped:?}");
            }
        }
        self.events.push_back(event);
    }

    pub(crate) fn drain(&mut self) -> Vec<HandlerEvent> {
        self.events.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }
}
