//! Sequence-number gate for poll results
//!
//! Every invocation gets a sequence number at dispatch time. A result is
//! applied only if it is newer than everything applied before it and the
//! owning poller has not been stopped. The check and the application happen
//! under one lock, so a stale result can never slip in between.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Outcome of offering a result to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The result was applied
    Applied,
    /// A result with an equal or higher sequence number was already applied
    Stale { applied: u64 },
    /// The poller was stopped before the result arrived
    Stopped,
}

struct GateState<A> {
    applied: u64,
    stopped: bool,
    apply: A,
}

/// Gate serializing result application for one scheduled task
pub struct SequenceGate<A> {
    next_seq: AtomicU64,
    state: Mutex<GateState<A>>,
}

impl<A> SequenceGate<A> {
    /// Create a gate that forwards admitted results to `apply`
    pub fn new(apply: A) -> Self {
        Self {
            next_seq: AtomicU64::new(0),
            state: Mutex::new(GateState {
                applied: 0,
                stopped: false,
                apply,
            }),
        }
    }

    /// Reserve the next sequence number (starts at 1)
    pub fn dispatch(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Offer the result of invocation `seq`
    pub fn admit<T>(&self, seq: u64, value: T) -> Admission
    where
        A: FnMut(T),
    {
        let mut state = self.lock();
        if state.stopped {
            return Admission::Stopped;
        }
        if seq <= state.applied {
            return Admission::Stale {
                applied: state.applied,
            };
        }
        (state.apply)(value);
        state.applied = seq;
        Admission::Applied
    }

    /// Suppress every result offered from now on
    pub fn stop(&self) {
        self.lock().stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Highest sequence number applied so far (0 if none)
    pub fn applied_seq(&self) -> u64 {
        self.lock().applied
    }

    /// Number of invocations dispatched so far
    pub fn dispatched(&self) -> u64 {
        self.next_seq.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GateState<A>> {
        // A panicking apply leaves counters intact; keep serving
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Type-erased control surface of a gate, used by poll handles
pub(crate) trait GateControl: Send + Sync {
    fn stop(&self);
    fn is_stopped(&self) -> bool;
    fn applied_seq(&self) -> u64;
    fn dispatched(&self) -> u64;
}

impl<A: Send> GateControl for SequenceGate<A> {
    fn stop(&self) {
        SequenceGate::stop(self)
    }

    fn is_stopped(&self) -> bool {
        SequenceGate::is_stopped(self)
    }

    fn applied_seq(&self) -> u64 {
        SequenceGate::applied_seq(self)
    }

    fn dispatched(&self) -> u64 {
        SequenceGate::dispatched(self)
    }
}
