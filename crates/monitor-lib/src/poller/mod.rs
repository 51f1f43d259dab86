//! Interval polling with stale-result suppression
//!
//! Every live panel polls the telemetry API through a [`PollingScheduler`].
//! Results are tagged with dispatch-order sequence numbers and only the
//! freshest one is ever applied; stopping a handle suppresses anything still
//! in flight.

mod gate;
mod scheduler;


pub use gate::{Admission, SequenceGate};
pub use scheduler::{PollHandle, PollingScheduler};
