//! Console status display
//!
//! This module renders the timeline for a human watching the console:
//! - Phase progress across the quantum
//! - Tempo, beat, phase and transport state on a spinner line
//!
//! The display is built using the indicatif library and only ever reads
//! shared state; it never writes pins or changes the transport.

mod progress;
mod status;

pub use progress::{create_phase_progress, create_status_spinner, PHASE_STEPS_PER_BEAT};
pub use status::{render_status_line, StatusDisplay};
