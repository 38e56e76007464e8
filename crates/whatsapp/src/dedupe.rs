use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use aurum_core::clock::Clock;

pub const DEFAULT_RETENTION_SECS: u64 = 15 * 60;
const DEFAULT_CAPACITY: usize = 100_000;

/// Bounded-window duplicate-delivery filter.
///
/// Ids live in two hash-set generations rotated once per retention window,
/// so a delivery id is recognized for at least one full window after it was
/// marked. Purging happens in bulk at rotation, never per entry. A capacity
/// bound forces early rotation under extreme backlog - acceptable because
/// provider retries arrive on a much shorter horizon than the window.
/// In-process only: a restart resets the filter.
pub struct DeliveryDeduper {
    clock: Arc<dyn Clock>,
    window: Duration,
    capacity: usize,
    state: Mutex<Generations>,
}

struct Generations {
    current: HashSet<String>,
    previous: HashSet<String>,
    rotated_at: DateTime<Utc>,
}

impl DeliveryDeduper {
    pub fn new(clock: Arc<dyn Clock>, retention_secs: u64) -> Self {
        Self::with_capacity(clock, retention_secs, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(clock: Arc<dyn Clock>, retention_secs: u64, capacity: usize) -> Self {
        let rotated_at = clock.now();
        Self {
            clock,
            window: Duration::seconds(retention_secs.max(1) as i64),
            capacity: capacity.max(1),
            state: Mutex::new(Generations {
                current: HashSet::new(),
                previous: HashSet::new(),
                rotated_at,
            }),
        }
    }

    /// Returns true when the id has not been seen within the window and
    /// marks it seen; false means a duplicate to be dropped.
    pub fn check_and_mark(&self, delivery_id: &str) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock().expect("deduper lock");
        self.rotate_if_due(&mut state, now);

        if state.current.contains(delivery_id) || state.previous.contains(delivery_id) {
            return false;
        }
        state.current.insert(delivery_id.to_string());
        true
    }

    pub fn seen(&self, delivery_id: &str) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock().expect("deduper lock");
        self.rotate_if_due(&mut state, now);
        state.current.contains(delivery_id) || state.previous.contains(delivery_id)
    }

    pub fn mark_seen(&self, delivery_id: &str) {
        let now = self.clock.now();
        let mut state = self.state.lock().expect("deduper lock");
        self.rotate_if_due(&mut state, now);
        state.current.insert(delivery_id.to_string());
    }

    fn rotate_if_due(&self, state: &mut Generations, now: DateTime<Utc>) {
        let elapsed = now - state.rotated_at;
        let over_capacity = state.current.len() >= self.capacity;

        if elapsed >= self.window + self.window {
            // Rotation is lazy, so a long-idle filter may owe several
            // rotations at once; everything is stale by now.
            state.current.clear();
            state.previous.clear();
            state.rotated_at = now;
        } else if elapsed >= self.window || over_capacity {
            state.previous = std::mem::take(&mut state.current);
            state.rotated_at = now;
        }
    }
}
