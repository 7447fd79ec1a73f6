//! Transport state machine
//!
//! ```text
//! Stopped --press--> Cued --phase boundary--> Playing
//!    ^                 |                         |
//!    +------press------+----------press----------+
//! ```
//!
//! Starting is quantized: a press only cues playback, and the output loop
//! launches it when the timeline phase reaches the quantum boundary.
//! Stopping is immediate.
//!
//! Each transition has one writer. The input poller owns every
//! press-driven transition and the output loop owns `Cued -> Playing`.

use log::info;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TransportState {
    Stopped = 0,
    Cued = 1,
    Playing = 2,
}

impl TransportState {
    /// State after a debounced button press
    pub fn on_press(self) -> TransportState {
        match self {
            TransportState::Stopped => TransportState::Cued,
            TransportState::Cued => TransportState::Stopped,
            TransportState::Playing => TransportState::Stopped,
        }
    }

    fn from_u8(value: u8) -> TransportState {
        match value {
            1 => TransportState::Cued,
            2 => TransportState::Playing,
            _ => TransportState::Stopped,
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportState::Stopped => "stopped",
            TransportState::Cued => "cued",
            TransportState::Playing => "playing",
        };
        f.write_str(name)
    }
}

/// Lock-free transport state shared by the polling loops
#[derive(Debug)]
pub struct SharedTransport {
    state: AtomicU8,
}

impl Default for SharedTransport {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(TransportState::Stopped as u8),
        }
    }
}

impl SharedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TransportState {
        TransportState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Applies a button press and returns the new state.
    pub fn press(&self) -> TransportState {
        let previous = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                Some(TransportState::from_u8(raw).on_press() as u8)
            })
            .unwrap_or_else(|raw| raw);
        let previous = TransportState::from_u8(previous);
        let next = previous.on_press();
        info!("Transport {} -> {} (button)", previous, next);
        next
    }

    /// Launches cued playback once `phase` has reached the quantum boundary.
    ///
    /// Returns true if this call performed the `Cued -> Playing` transition.
    pub fn launch_if_cued(&self, phase: f64, phase_epsilon: f64) -> bool {
        if phase > phase_epsilon {
            return false;
        }

        let launched = self
            .state
            .compare_exchange(
                TransportState::Cued as u8,
                TransportState::Playing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if launched {
            info!("Transport cued -> playing at phase {:.4}", phase);
        }
        launched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_stopped() {
        assert_eq!(SharedTransport::new().state(), TransportState::Stopped);
    }

    #[test]
    fn test_press_transitions() {
        assert_eq!(TransportState::Stopped.on_press(), TransportState::Cued);
        assert_eq!(TransportState::Cued.on_press(), TransportState::Stopped);
        assert_eq!(TransportState::Playing.on_press(), TransportState::Stopped);
    }

    #[test]
    fn test_cue_then_launch_at_boundary() {
        let transport = SharedTransport::new();
        assert_eq!(transport.press(), TransportState::Cued);

        assert!(!transport.launch_if_cued(1.5, 0.01));
        assert_eq!(transport.state(), TransportState::Cued);

        assert!(transport.launch_if_cued(0.0001, 0.01));
        assert_eq!(transport.state(), TransportState::Playing);
    }

    #[test]
    fn test_launch_ignored_unless_cued() {
        let transport = SharedTransport::new();
        assert!(!transport.launch_if_cued(0.0, 0.01));
        assert_eq!(transport.state(), TransportState::Stopped);

        transport.press();
        transport.launch_if_cued(0.0, 0.01);
        assert!(!transport.launch_if_cued(0.0, 0.01));
        assert_eq!(transport.state(), TransportState::Playing);
    }

    #[test]
    fn test_stop_is_immediate() {
        let transport = SharedTransport::new();
        transport.press();
        transport.launch_if_cued(0.0, 0.01);

        assert_eq!(transport.press(), TransportState::Stopped);
        assert!(!transport.launch_if_cued(0.0, 0.01));
        assert_eq!(transport.state(), TransportState::Stopped);
    }
}
