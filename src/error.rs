use crate::pins::PinError;
use crate::pulse::PulseError;
use std::error::Error;
use std::fmt;

/// Errors raised by the gate engine and its collaborators
#[derive(Debug)]
pub enum GateError {
    /// Settings that cannot produce a usable clock
    Config(String),
    /// Pulse shape could not be computed for a snapshot
    Pulse(PulseError),
    /// Pin I/O driver failure
    Pin { pin: u32, message: String },
    /// MIDI clock source failure
    Midi(String),
    /// Logger could not be installed
    Logging(String),
    /// A polling loop panicked
    Thread(String),
    Io(std::io::Error),
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateError::Config(msg) => write!(f, "configuration error: {}", msg),
            GateError::Pulse(err) => write!(f, "pulse error: {}", err),
            GateError::Pin { pin, message } => write!(f, "pin {} error: {}", pin, message),
            GateError::Midi(msg) => write!(f, "MIDI error: {}", msg),
            GateError::Logging(msg) => write!(f, "logging error: {}", msg),
            GateError::Thread(msg) => write!(f, "thread error: {}", msg),
            GateError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for GateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GateError::Pulse(err) => Some(err),
            GateError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PulseError> for GateError {
    fn from(err: PulseError) -> Self {
        GateError::Pulse(err)
    }
}

impl From<PinError> for GateError {
    fn from(err: PinError) -> Self {
        GateError::Pin {
            pin: err.pin.0,
            message: err.message,
        }
    }
}

impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        GateError::Io(err)
    }
}

impl From<config::ConfigError> for GateError {
    fn from(err: config::ConfigError) -> Self {
        GateError::Config(err.to_string())
    }
}

/// Result type for gate operations
pub type Result<T> = std::result::Result<T, GateError>;
