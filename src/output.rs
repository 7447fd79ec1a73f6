//! Output driver: timeline snapshot in, pin levels out

use crate::config::{PinAssignments, Settings};
use crate::error::Result;
use crate::pins::{Level, PinDriver};
use crate::pulse::PulseConfig;
use crate::timeline::{Timeline, TimelineSnapshot};
use crate::transport::{SharedTransport, TransportState};

/// Levels for the three output pins in one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFrame {
    pub clock: Level,
    pub reset: Level,
    pub indicator: Level,
}

impl OutputFrame {
    pub const IDLE: OutputFrame = OutputFrame {
        clock: Level::Low,
        reset: Level::Low,
        indicator: Level::Low,
    };
}

/// Indicator blink while a start is pending: on for even half-beats
pub fn cue_blink(beat: f64) -> bool {
    ((beat * 2.0).floor() as i64).rem_euclid(2) == 0
}

pub struct OutputDriver<'a> {
    pins: &'a dyn PinDriver,
    timeline: &'a dyn Timeline,
    transport: &'a SharedTransport,
    assignments: PinAssignments,
    pulse: PulseConfig,
    quantum: f64,
    phase_epsilon: f64,
    indicator_when_playing: bool,
}

impl<'a> OutputDriver<'a> {
    pub fn new(
        pins: &'a dyn PinDriver,
        timeline: &'a dyn Timeline,
        transport: &'a SharedTransport,
        settings: &Settings,
    ) -> Self {
        Self {
            pins,
            timeline,
            transport,
            assignments: settings.pins,
            pulse: settings.pulse_config(),
            quantum: settings.quantum,
            phase_epsilon: settings.phase_epsilon,
            indicator_when_playing: settings.indicator_when_playing,
        }
    }

    /// Decides the output levels for a snapshot.
    ///
    /// A cued transport is launched here when the phase reaches the quantum
    /// boundary, and the launching sample already carries the first pulse.
    pub fn decide(&self, snapshot: &TimelineSnapshot) -> Result<OutputFrame> {
        let mut state = self.transport.state();
        if state == TransportState::Cued
            && self
                .transport
                .launch_if_cued(snapshot.phase, self.phase_epsilon)
        {
            state = TransportState::Playing;
        }

        let frame = match state {
            TransportState::Playing => {
                let gates = self.pulse.gates(snapshot)?;
                OutputFrame {
                    clock: gates.clock.into(),
                    reset: gates.reset.into(),
                    indicator: self.indicator_when_playing.into(),
                }
            }
            TransportState::Cued => OutputFrame {
                indicator: cue_blink(snapshot.beat).into(),
                ..OutputFrame::IDLE
            },
            TransportState::Stopped => OutputFrame::IDLE,
        };
        Ok(frame)
    }

    pub fn write_frame(&self, frame: OutputFrame) -> Result<()> {
        self.pins.write(self.assignments.clock(), frame.clock)?;
        self.pins.write(self.assignments.reset(), frame.reset)?;
        self.pins
            .write(self.assignments.indicator(), frame.indicator)?;
        Ok(())
    }

    /// One iteration of the output loop: sample, decide, write.
    pub fn step(&self) -> Result<OutputFrame> {
        let snapshot = self.timeline.capture(self.quantum);
        let frame = self.decide(&snapshot)?;
        self.write_frame(frame)?;
        Ok(frame)
    }
}
