//! Timeline sources
//!
//! A timeline answers "where are we in the music at this instant": tempo,
//! beat position and phase within a quantum. The gate engine only ever reads
//! from a timeline; it never computes tempo or phase on its own.
//!
//! The main components are:
//! - [`Timeline`] trait, the interface every source implements
//! - [`InternalTimeline`] for a free-running clock at a fixed tempo
//! - [`MidiClockTimeline`] for following an external 24 PPQN MIDI clock
//! - [`ManualTimeline`] for tests and simulations
//!
mod internal;
mod manual;
pub mod midi_clock;

pub use internal::InternalTimeline;
pub use manual::ManualTimeline;
pub use midi_clock::{list_input_ports, ClockFollower, MidiClockTimeline};

use std::sync::Arc;
use std::time::Instant;

/// Tempo, beat and phase sampled at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineSnapshot {
    /// Beats per minute
    pub tempo: f64,
    /// Position in beats
    pub beat: f64,
    /// Position within the quantum, in `[0, quantum)`
    pub phase: f64,
}

impl TimelineSnapshot {
    /// Builds a snapshot whose phase is `beat` wrapped into the quantum.
    pub fn at_beat(tempo: f64, beat: f64, quantum: f64) -> Self {
        Self {
            tempo,
            beat,
            phase: phase_in_quantum(beat, quantum),
        }
    }
}

/// Wraps `beat` into `[0, quantum)`.
pub fn phase_in_quantum(beat: f64, quantum: f64) -> f64 {
    let phase = beat.rem_euclid(quantum);
    if phase >= quantum {
        0.0
    } else {
        phase
    }
}

/// Source of the shared musical timeline
///
/// Implementations are assumed to be always available: reads never fail and
/// never block for longer than a short lock.
pub trait Timeline: Send + Sync {
    /// Current instant on the timeline's clock
    fn now(&self) -> Instant;

    /// Tempo, beat and phase at `at` for the given quantum
    fn snapshot(&self, at: Instant, quantum: f64) -> TimelineSnapshot;

    /// Joins or leaves the shared session
    fn enable(&self, enabled: bool);

    /// Convenience for `snapshot(now(), quantum)`
    fn capture(&self, quantum: f64) -> TimelineSnapshot {
        self.snapshot(self.now(), quantum)
    }
}

impl<T: Timeline + ?Sized> Timeline for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn snapshot(&self, at: Instant, quantum: f64) -> TimelineSnapshot {
        (**self).snapshot(at, quantum)
    }

    fn enable(&self, enabled: bool) {
        (**self).enable(enabled)
    }
}
