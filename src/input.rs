//! Transport button polling

use crate::error::Result;
use crate::pins::{Level, Pin, PinDriver};
use crate::transport::{SharedTransport, TransportState};
use log::debug;

/// Rising edge detector over raw button samples
///
/// A button held across many samples yields one edge, on the first sample
/// that sees it pressed.
#[derive(Debug, Clone, Copy)]
pub struct ButtonEdge {
    last_pressed: bool,
}

impl ButtonEdge {
    pub fn new(initially_pressed: bool) -> Self {
        Self {
            last_pressed: initially_pressed,
        }
    }

    /// Records a sample and reports whether it is a press.
    pub fn update(&mut self, pressed: bool) -> bool {
        let rising = pressed && !self.last_pressed;
        self.last_pressed = pressed;
        rising
    }
}

/// Polls the transport button and applies press transitions
pub struct InputPoller<'a> {
    pins: &'a dyn PinDriver,
    transport: &'a SharedTransport,
    button: Pin,
    active_low: bool,
    edge: ButtonEdge,
}

impl<'a> InputPoller<'a> {
    /// Creates a poller primed with the current button level, so a button
    /// already held at startup does not count as a press.
    pub fn new(
        pins: &'a dyn PinDriver,
        transport: &'a SharedTransport,
        button: Pin,
        active_low: bool,
    ) -> Result<Self> {
        let initial = is_pressed(pins.read(button)?, active_low);
        Ok(Self {
            pins,
            transport,
            button,
            active_low,
            edge: ButtonEdge::new(initial),
        })
    }

    /// Samples the button once; returns the new transport state on a press.
    pub fn poll(&mut self) -> Result<Option<TransportState>> {
        let level = self.pins.read(self.button)?;
        if self.edge.update(is_pressed(level, self.active_low)) {
            debug!("Transport button pressed on pin {}", self.button);
            return Ok(Some(self.transport.press()));
        }
        Ok(None)
    }
}

fn is_pressed(level: Level, active_low: bool) -> bool {
    level.is_high() != active_low
}
