//! Pulse generation
//!
//! Turns a [`TimelineSnapshot`] into gate levels for the clock and reset
//! outputs. Everything here is pure arithmetic so it can run inside the
//! output loop without allocation or blocking.
//!
//! The clock is high for the first `high_fraction` of each subdivided pulse
//! cycle, where a cycle is `1 / pulses_per_beat` beats long. The reset line
//! uses the un-multiplied phase so it fires once per quantum regardless of
//! subdivision.

use crate::timeline::TimelineSnapshot;
use std::error::Error;
use std::fmt;

/// Width of the high part of a pulse
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PulseWidth {
    /// Fixed real-time duration, converted per sample using the current tempo
    Seconds(f64),
    /// Fixed fraction of a pulse cycle, independent of tempo
    BeatFraction(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PulseError {
    NonPositiveTempo(f64),
    /// The high part would fill the whole cycle, so the line never goes low
    WidthTooWide { tempo: f64, high_fraction: f64 },
    NonPositiveWidth(f64),
}

impl fmt::Display for PulseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PulseError::NonPositiveTempo(tempo) => {
                write!(f, "tempo must be positive, got {}", tempo)
            }
            PulseError::WidthTooWide {
                tempo,
                high_fraction,
            } => write!(
                f,
                "pulse width covers {:.3} of the cycle at {:.2} BPM; the line would never go low",
                high_fraction, tempo
            ),
            PulseError::NonPositiveWidth(width) => {
                write!(f, "pulse width must be positive, got {}", width)
            }
        }
    }
}

impl Error for PulseError {}

/// Gate levels for one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gates {
    pub clock: bool,
    pub reset: bool,
}

pub fn seconds_per_beat(tempo: f64) -> f64 {
    60.0 / tempo
}

/// Fractional part of `value`, always in `[0, 1)` even for negative input.
pub fn fractional_part(value: f64) -> f64 {
    let fraction = value - value.floor();
    // Rounding can land on exactly 1.0 for tiny negative values
    if fraction >= 1.0 {
        0.0
    } else {
        fraction
    }
}

impl PulseWidth {
    /// Portion of a pulse cycle the line spends high at `tempo`.
    pub fn high_fraction(&self, tempo: f64) -> Result<f64, PulseError> {
        if !(tempo > 0.0) {
            return Err(PulseError::NonPositiveTempo(tempo));
        }

        let high_fraction = match *self {
            PulseWidth::Seconds(seconds) => {
                if !(seconds > 0.0) {
                    return Err(PulseError::NonPositiveWidth(seconds));
                }
                seconds / seconds_per_beat(tempo)
            }
            PulseWidth::BeatFraction(fraction) => {
                if !(fraction > 0.0) {
                    return Err(PulseError::NonPositiveWidth(fraction));
                }
                fraction
            }
        };

        if high_fraction >= 1.0 {
            return Err(PulseError::WidthTooWide {
                tempo,
                high_fraction,
            });
        }
        Ok(high_fraction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseConfig {
    pub pulses_per_beat: f64,
    pub width: PulseWidth,
}

impl PulseConfig {
    pub fn new(pulses_per_beat: f64, width: PulseWidth) -> Self {
        Self {
            pulses_per_beat,
            width,
        }
    }

    /// Position within the current subdivided pulse cycle.
    pub fn beat_fraction(&self, beat: f64) -> f64 {
        fractional_part(beat * self.pulses_per_beat)
    }

    pub fn gates(&self, snapshot: &TimelineSnapshot) -> Result<Gates, PulseError> {
        let high_fraction = self.width.high_fraction(snapshot.tempo)?;

        Ok(Gates {
            clock: self.beat_fraction(snapshot.beat) <= high_fraction,
            reset: snapshot.phase <= high_fraction,
        })
    }

    /// Checks that the pulse shape holds for every tempo in `[min, max]`.
    ///
    /// A real-time width grows as a share of the beat when the tempo rises,
    /// so checking both ends covers the whole range.
    pub fn validate_tempo_range(&self, min_tempo: f64, max_tempo: f64) -> Result<(), PulseError> {
        self.width.high_fraction(min_tempo)?;
        self.width.high_fraction(max_tempo)?;
        Ok(())
    }
}
