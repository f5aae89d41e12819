//! Virtual-time timer scheduling.
//!
//! The machine uses **guest virtual time** (monotonic cycles of the primary
//! clock since reset) as the single source of truth for every timed event:
//! bus-controller timeouts, peripheral reply latency, periodic device ticks.
//! Nothing in this crate reads a host clock, which is what keeps replays and
//! tests deterministic: the same schedule of `schedule`/`cancel`/`pop_due`
//! calls always fires the same events in the same order.

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Handle for a scheduled timer, used to cancel it before expiry.
///
/// Ids are unique over the lifetime of a queue and never reused, so a stale
/// handle held by a device after its timer fired is harmless to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<T> {
    deadline: u64,
    seq: u64,
    id: TimerId,
    payload: T,
}

// BinaryHeap is a max-heap; invert the ordering so the earliest deadline is
// at the top. Equal deadlines fire in schedule order (seq tiebreak), which
// keeps multi-timer interactions deterministic.
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.deadline, other.seq).cmp(&(self.deadline, self.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

/// Ordered queue of pending timer events, keyed by absolute deadline.
///
/// `T` is the caller's payload, typically an enum identifying which device
/// timer fired. Cancellation is lazy: `cancel` tombstones the id and the
/// entry is dropped when it surfaces, so both operations stay `O(log n)`.
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    cancelled: std::collections::HashSet<TimerId>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            cancelled: std::collections::HashSet::new(),
            next_seq: 0,
        }
    }

    /// Schedules `payload` to fire once `now >= deadline`. Returns a handle
    /// that can cancel the event before it fires.
    pub fn schedule(&mut self, deadline: u64, payload: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = TimerId(seq);
        self.heap.push(Entry {
            deadline,
            seq,
            id,
            payload,
        });
        id
    }

    /// Cancels a pending timer. Returns `false` if the timer already fired
    /// or was cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        if self.heap.iter().any(|e| e.id == id) {
            self.cancelled.insert(id)
        } else {
            false
        }
    }

    /// Pops the earliest event with `deadline <= now`, if any. Call in a
    /// loop to drain everything due at the current time.
    pub fn pop_due(&mut self, now: u64) -> Option<(TimerId, T)> {
        while self.heap.peek().is_some_and(|e| e.deadline <= now) {
            let entry = self.heap.pop()?;
            if self.cancelled.remove(&entry.id) {
                continue;
            }
            return Some((entry.id, entry.payload));
        }
        None
    }

    /// Earliest pending deadline, ignoring cancelled entries.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.heap
            .iter()
            .filter(|e| !self.cancelled.contains(&e.id))
            .map(|e| e.deadline)
            .min()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.len() == self.cancelled.len()
    }

    /// Drops every pending event. Used on machine reset; ids issued before
    /// the clear stay invalid forever.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.cancelled.clear();
    }
}
