//! Deferred events on the session clock
//!
//! Timers do not hold closures. Each entry carries the [`RoundToken`] of the
//! round that scheduled it plus a plain event value; the session decides on
//! fire whether the event still applies.

use serde::{Deserialize, Serialize};

/// Identifies one round. A new token is issued on every accepted trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoundToken(pub u64);

impl std::fmt::Display for RoundToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "round#{}", self.0)
    }
}

/// Handle for cancelling a scheduled event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Entry<E> {
    id: TimerId,
    due_ms: f64,
    token: RoundToken,
    event: E,
}

/// An event whose delay elapsed
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub id: TimerId,
    pub due_ms: f64,
    pub token: RoundToken,
    pub event: E,
}

/// Single-threaded timer queue driven by `advance`
#[derive(Debug, Clone)]
pub struct TimerQueue<E> {
    now_ms: f64,
    next_id: u64,
    entries: Vec<Entry<E>>,
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Current clock (ms since creation)
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Schedule `event` to fire `delay_ms` from now. Negative delays fire on the next advance.
    pub fn schedule(&mut self, delay_ms: f64, token: RoundToken, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due_ms: self.now_ms + delay_ms.max(0.0),
            token,
            event,
        });
        id
    }

    /// Remove a pending event. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Drop every pending event; returns how many were dropped
    pub fn cancel_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move the clock forward and return every due event, ordered by due time
    /// then by scheduling order.
    pub fn advance(&mut self, dt_ms: f64) -> Vec<Fired<E>> {
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.now_ms += dt_ms;
        }
        let now = self.now_ms;

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].due_ms <= now {
                due.push(self.entries.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.id.cmp(&b.id)));
        due.into_iter()
            .map(|e| Fired {
                id: e.id,
                due_ms: e.due_ms,
                token: e.token,
                event: e.event,
            })
            .collect()
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
