//! Redelivery guard for inbound events.
//!
//! Socket Mode may deliver the same message more than once (reconnects,
//! unacknowledged envelopes). [`EventDeduplicator`] remembers the most
//! recent event keys in a bounded FIFO and reports repeats.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use tracing::warn;

use crate::models::InboundEvent;

/// Bounded set of recently seen event keys.
#[derive(Debug)]
pub struct EventDeduplicator {
    capacity: usize,
    seen: Mutex<Seen>,
}

#[derive(Debug, Default)]
struct Seen {
    order: VecDeque<String>,
    keys: HashSet<String>,
}

impl EventDeduplicator {
    /// Create a deduplicator remembering at most `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            seen: Mutex::new(Seen::default()),
        }
    }

    /// Record `event` and return `true` if it has not been seen before.
    ///
    /// Events without a timestamp or envelope id cannot be tracked and are
    /// always treated as first deliveries.
    pub fn first_delivery(&self, event: &InboundEvent) -> bool {
        let Some(key) = event.dedup_key() else {
            return true;
        };

        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("dedup lock poisoned; recovering");
                poisoned.into_inner()
            }
        };

        if seen.keys.contains(&key) {
            return false;
        }

        if seen.order.len() == self.capacity {
            if let Some(oldest) = seen.order.pop_front() {
                seen.keys.remove(&oldest);
            }
        }
        seen.keys.insert(key.clone());
        seen.order.push_back(key);
        true
    }

    /// Number of event keys currently remembered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.lock().map_or(0, |seen| seen.order.len())
    }

    /// Whether no events have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
