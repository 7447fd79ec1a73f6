// config.rs

use crate::error::{GateError, Result};
use crate::pins::{Pin, Pull};
use crate::pulse::{PulseConfig, PulseWidth};
use log::{debug, LevelFilter};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "PHASORGATE";

/// Pin numbers for the four logical lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PinAssignments {
    pub clock: u32,
    pub reset: u32,
    pub indicator: u32,
    pub button: u32,
}

impl Default for PinAssignments {
    fn default() -> Self {
        Self {
            clock: 22,
            reset: 23,
            indicator: 24,
            button: 25,
        }
    }
}

impl PinAssignments {
    pub fn clock(&self) -> Pin {
        Pin(self.clock)
    }

    pub fn reset(&self) -> Pin {
        Pin(self.reset)
    }

    pub fn indicator(&self) -> Pin {
        Pin(self.indicator)
    }

    pub fn button(&self) -> Pin {
        Pin(self.button)
    }

    pub fn outputs(&self) -> [Pin; 3] {
        [self.clock(), self.reset(), self.indicator()]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tempo of the internal timeline
    pub tempo: f64,
    pub pulses_per_beat: f64,
    pub pulse_width_seconds: f64,
    /// When set, pulses are this fraction of a cycle and `pulse_width_seconds` is unused
    pub pulse_width_fraction: Option<f64>,
    pub quantum: f64,
    pub phase_epsilon: f64,
    /// Tempo range the pulse shape has to work for
    pub min_tempo: f64,
    pub max_tempo: f64,
    pub output_period_us: u64,
    pub input_period_ms: u64,
    pub status_period_ms: u64,
    pub pins: PinAssignments,
    pub button_pull: Pull,
    pub button_active_low: bool,
    pub indicator_when_playing: bool,
    pub gpio_root: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tempo: 120.0,
            pulses_per_beat: 1.0,
            pulse_width_seconds: 0.015,
            pulse_width_fraction: None,
            quantum: 4.0,
            phase_epsilon: 0.01,
            min_tempo: 20.0,
            max_tempo: 999.0,
            output_period_us: 250,
            input_period_ms: 10,
            status_period_ms: 10,
            pins: PinAssignments::default(),
            button_pull: Pull::Down,
            button_active_low: false,
            indicator_when_playing: true,
            gpio_root: PathBuf::from("/sys/class/gpio"),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// `$HOME/.config/phasorgate/config.toml`, if HOME is set
pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("phasorgate")
            .join("config.toml"),
    )
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    /// Loads defaults, then the config file, then `PHASORGATE_*` variables.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                debug!("Loading settings from {}", path.display());
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(default_path) = default_config_path() {
                    debug!("Looking for settings at {}", default_path.display());
                    builder = builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let settings: Settings = builder
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Parses settings from TOML text, without file or environment layers.
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn pulse_width(&self) -> PulseWidth {
        match self.pulse_width_fraction {
            Some(fraction) => PulseWidth::BeatFraction(fraction),
            None => PulseWidth::Seconds(self.pulse_width_seconds),
        }
    }

    pub fn pulse_config(&self) -> PulseConfig {
        PulseConfig::new(self.pulses_per_beat, self.pulse_width())
    }

    pub fn output_period(&self) -> Duration {
        Duration::from_micros(self.output_period_us)
    }

    pub fn input_period(&self) -> Duration {
        Duration::from_millis(self.input_period_ms)
    }

    pub fn status_period(&self) -> Duration {
        Duration::from_millis(self.status_period_ms)
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse::<LevelFilter>()
            .map_err(|_| GateError::Config(format!("unknown log level '{}'", self.log_level)))
    }

    /// Rejects settings that cannot produce a usable clock.
    ///
    /// Out-of-range values are reported, never clamped.
    pub fn validate(&self) -> Result<()> {
        positive("quantum", self.quantum)?;
        positive("pulses_per_beat", self.pulses_per_beat)?;
        positive("min_tempo", self.min_tempo)?;
        positive("max_tempo", self.max_tempo)?;

        if !self.phase_epsilon.is_finite()
            || self.phase_epsilon < 0.0
            || self.phase_epsilon >= self.quantum
        {
            return Err(GateError::Config(format!(
                "phase_epsilon must be in [0, {}), got {}",
                self.quantum, self.phase_epsilon
            )));
        }

        if self.min_tempo > self.max_tempo {
            return Err(GateError::Config(format!(
                "min_tempo {} is above max_tempo {}",
                self.min_tempo, self.max_tempo
            )));
        }

        if !(self.min_tempo..=self.max_tempo).contains(&self.tempo) {
            return Err(GateError::Config(format!(
                "tempo {} is outside [{}, {}]",
                self.tempo, self.min_tempo, self.max_tempo
            )));
        }

        for (name, period) in [
            ("output_period_us", self.output_period_us),
            ("input_period_ms", self.input_period_ms),
            ("status_period_ms", self.status_period_ms),
        ] {
            if period == 0 {
                return Err(GateError::Config(format!("{} must be non-zero", name)));
            }
        }

        let mut seen = HashSet::new();
        for pin in [
            self.pins.clock,
            self.pins.reset,
            self.pins.indicator,
            self.pins.button,
        ] {
            if !seen.insert(pin) {
                return Err(GateError::Config(format!(
                    "pin {} is assigned more than once",
                    pin
                )));
            }
        }

        self.level_filter()?;
        self.pulse_config()
            .validate_tempo_range(self.min_tempo, self.max_tempo)?;
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GateError::Config(format!(
            "{} must be a positive number, got {}",
            name, value
        )))
    }
}
