//! Digital pin access
//!
//! The gate engine talks to hardware through the [`PinDriver`] trait:
//! - [`SysfsPins`] drives Linux GPIO lines through `/sys/class/gpio`
//! - [`MemoryPins`] keeps levels in memory, for dry runs and tests
//!
mod memory;
mod sysfs;

pub use memory::MemoryPins;
pub use sysfs::SysfsPins;

use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Pin number as understood by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pin(pub u32);

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Input pull resistor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pull {
    Off,
    Down,
    Up,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinError {
    pub pin: Pin,
    pub message: String,
}

impl PinError {
    pub fn new(pin: Pin, message: impl Into<String>) -> Self {
        Self {
            pin,
            message: message.into(),
        }
    }
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pin {}: {}", self.pin, self.message)
    }
}

impl Error for PinError {}

/// Trait defining the interface for pin I/O implementations
///
/// Methods take `&self` because the output and input loops share one driver.
pub trait PinDriver: Send + Sync {
    /// Sets up a pin once at startup
    fn configure(&self, pin: Pin, direction: Direction, pull: Option<Pull>)
        -> Result<(), PinError>;

    /// Drives an output pin
    fn write(&self, pin: Pin, level: Level) -> Result<(), PinError>;

    /// Samples an input pin
    fn read(&self, pin: Pin) -> Result<Level, PinError>;
}

impl<T: PinDriver + ?Sized> PinDriver for Arc<T> {
    fn configure(
        &self,
        pin: Pin,
        direction: Direction,
        pull: Option<Pull>,
    ) -> Result<(), PinError> {
        (**self).configure(pin, direction, pull)
    }

    fn write(&self, pin: Pin, level: Level) -> Result<(), PinError> {
        (**self).write(pin, level)
    }

    fn read(&self, pin: Pin) -> Result<Level, PinError> {
        (**self).read(pin)
    }
}
