use crate::config::Settings;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Clock, reset and transport gates from a shared musical timeline", long_about = None)]
pub struct Args {
    /// Settings file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Tempo of the internal timeline in BPM
    #[arg(long)]
    pub tempo: Option<f64>,

    /// Clock pulses per beat (4 for sixteenths)
    #[arg(long)]
    pub pulses_per_beat: Option<f64>,

    /// Pulse width in seconds
    #[arg(long, value_name = "SECONDS", conflicts_with = "pulse_width_fraction")]
    pub pulse_width_seconds: Option<f64>,

    /// Pulse width as a fraction of the pulse cycle
    #[arg(long, value_name = "FRACTION")]
    pub pulse_width_fraction: Option<f64>,

    /// Beats per transport cycle
    #[arg(long)]
    pub quantum: Option<f64>,

    /// How close to the quantum boundary a cued start may launch
    #[arg(long)]
    pub phase_epsilon: Option<f64>,

    #[arg(long)]
    pub clock_pin: Option<u32>,

    #[arg(long)]
    pub reset_pin: Option<u32>,

    #[arg(long)]
    pub indicator_pin: Option<u32>,

    #[arg(long)]
    pub button_pin: Option<u32>,

    /// Follow the MIDI clock of a device instead of the internal timeline
    #[arg(long, value_name = "DEVICE")]
    pub midi_clock: Option<String>,

    /// Pick the MIDI clock device from a list
    #[arg(long, conflicts_with = "midi_clock")]
    pub choose_midi_input: bool,

    /// List available MIDI input devices
    #[arg(long)]
    pub list_midi_inputs: bool,

    /// Keep pin levels in memory instead of driving GPIO
    #[arg(long)]
    pub dry_run: bool,

    /// Cue a start right away, as if the button had been pressed
    #[arg(long)]
    pub cue_on_start: bool,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub run_for: Option<f64>,

    /// Hide the status display
    #[arg(long, short)]
    pub quiet: bool,
}

impl Args {
    /// Applies command-line overrides on top of loaded settings.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(tempo) = self.tempo {
            settings.tempo = tempo;
        }
        if let Some(pulses_per_beat) = self.pulses_per_beat {
            settings.pulses_per_beat = pulses_per_beat;
        }
        if let Some(seconds) = self.pulse_width_seconds {
            settings.pulse_width_seconds = seconds;
            settings.pulse_width_fraction = None;
        }
        if let Some(fraction) = self.pulse_width_fraction {
            settings.pulse_width_fraction = Some(fraction);
        }
        if let Some(quantum) = self.quantum {
            settings.quantum = quantum;
        }
        if let Some(epsilon) = self.phase_epsilon {
            settings.phase_epsilon = epsilon;
        }
        if let Some(pin) = self.clock_pin {
            settings.pins.clock = pin;
        }
        if let Some(pin) = self.reset_pin {
            settings.pins.reset = pin;
        }
        if let Some(pin) = self.indicator_pin {
            settings.pins.indicator = pin;
        }
        if let Some(pin) = self.button_pin {
            settings.pins.button = pin;
        }
    }

    pub fn run_duration(&self) -> Result<Option<Duration>, String> {
        match self.run_for {
            None => Ok(None),
            Some(seconds) => Duration::try_from_secs_f64(seconds)
                .map(Some)
                .map_err(|_| format!("invalid --run-for value: {}", seconds)),
        }
    }
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}
