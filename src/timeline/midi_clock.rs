//! Timeline driven by an external MIDI clock
//!
//! A MIDI clock sends 24 timing ticks per quarter note plus transport
//! messages. [`ClockFollower`] turns that stream into a tempo estimate and a
//! beat position, and [`MidiClockTimeline`] wires a follower to a `midir`
//! input port.

use super::{Timeline, TimelineSnapshot};
use crate::error::{GateError, Result};
use log::{debug, info, warn};
use midir::{Ignore, MidiInput, MidiInputConnection};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// MIDI standard PPQ (Pulses Per Quarter Note)
pub const TICKS_PER_BEAT: u64 = 24;
/// One Song Position Pointer unit is a sixteenth note
const TICKS_PER_SONG_POSITION: u64 = 6;
const DEFAULT_TEMPO: f64 = 120.0;
const WINDOW_SIZE: usize = 24;
const MIN_INTERVAL: Duration = Duration::from_micros(1000);
/// Gaps longer than this mean the clock paused; the window starts over
const MAX_INTERVAL: Duration = Duration::from_secs(1);

/// MIDI real-time and system-common messages the follower understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMessage {
    Tick,
    Start,
    Continue,
    Stop,
    /// Position in sixteenth notes from the start of the song
    SongPosition(u16),
}

impl ClockMessage {
    pub fn parse(data: &[u8]) -> Option<Self> {
        match data.first()? {
            0xF8 => Some(ClockMessage::Tick),
            0xFA => Some(ClockMessage::Start),
            0xFB => Some(ClockMessage::Continue),
            0xFC => Some(ClockMessage::Stop),
            0xF2 if data.len() >= 3 => {
                let lsb = u16::from(data[1] & 0x7F);
                let msb = u16::from(data[2] & 0x7F);
                Some(ClockMessage::SongPosition((msb << 7) | lsb))
            }
            _ => None,
        }
    }
}

/// Tracks tempo and position from a stream of clock messages
#[derive(Debug)]
pub struct ClockFollower {
    position_ticks: u64,
    /// After Start or a relocation the next tick lands on `position_ticks`
    awaiting_first_tick: bool,
    playing: bool,
    last_tick: Option<Instant>,
    intervals: VecDeque<Duration>,
    tempo: f64,
}

impl Default for ClockFollower {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockFollower {
    /// Creates a follower that advances on ticks until told to stop, so a
    /// clock that was already running when we connected is still followed.
    pub fn new() -> Self {
        Self {
            position_ticks: 0,
            awaiting_first_tick: true,
            playing: true,
            last_tick: None,
            intervals: VecDeque::with_capacity(WINDOW_SIZE),
            tempo: DEFAULT_TEMPO,
        }
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn handle_message(&mut self, msg: ClockMessage, at: Instant) {
        match msg {
            ClockMessage::Tick => self.handle_tick(at),
            ClockMessage::Start => {
                self.playing = true;
                self.position_ticks = 0;
                self.awaiting_first_tick = true;
                info!("MIDI clock start");
            }
            ClockMessage::Continue => {
                self.playing = true;
                info!("MIDI clock continue");
            }
            ClockMessage::Stop => {
                self.playing = false;
                info!("MIDI clock stop");
            }
            ClockMessage::SongPosition(sixteenths) => {
                self.position_ticks = u64::from(sixteenths) * TICKS_PER_SONG_POSITION;
                self.awaiting_first_tick = true;
                debug!("MIDI song position set to {} sixteenths", sixteenths);
            }
        }
    }

    fn handle_tick(&mut self, at: Instant) {
        if let Some(last) = self.last_tick {
            let interval = at.saturating_duration_since(last);
            if interval > MAX_INTERVAL {
                self.intervals.clear();
            } else if interval >= MIN_INTERVAL {
                self.intervals.push_back(interval);
                while self.intervals.len() > WINDOW_SIZE {
                    self.intervals.pop_front();
                }
                if let Some(tempo) = self.estimate_tempo() {
                    self.tempo = tempo;
                }
            }
        }
        self.last_tick = Some(at);

        if self.playing {
            if self.awaiting_first_tick {
                self.awaiting_first_tick = false;
            } else {
                self.position_ticks += 1;
            }
        }
    }

    /// Averages the middle half of the sorted window to ignore jitter outliers.
    fn estimate_tempo(&self) -> Option<f64> {
        if self.intervals.len() < 3 {
            return None;
        }

        let mut sorted: Vec<Duration> = self.intervals.iter().copied().collect();
        sorted.sort();

        let start = sorted.len() / 4;
        let end = (sorted.len() * 3) / 4;
        let middle = &sorted[start..end.max(start + 1)];

        let average = middle.iter().sum::<Duration>() / middle.len() as u32;
        let ticks_per_minute = 60.0 / average.as_secs_f64();
        Some(ticks_per_minute / TICKS_PER_BEAT as f64)
    }

    pub fn beat_at(&self, at: Instant) -> f64 {
        let base = self.position_ticks as f64 / TICKS_PER_BEAT as f64;
        if !self.playing || self.awaiting_first_tick {
            return base;
        }

        let Some(last) = self.last_tick else {
            return base;
        };

        let tick_seconds = 60.0 / (self.tempo * TICKS_PER_BEAT as f64);
        let elapsed = at.saturating_duration_since(last).as_secs_f64();
        // Never run past the next tick, so the position stays monotonic
        let progress = (elapsed / tick_seconds).min(1.0);
        base + progress / TICKS_PER_BEAT as f64
    }

    pub fn snapshot(&self, at: Instant, quantum: f64) -> TimelineSnapshot {
        TimelineSnapshot::at_beat(self.tempo, self.beat_at(at), quantum)
    }
}

/// Lists the names of the available MIDI input ports
pub fn list_input_ports() -> Result<Vec<String>> {
    let midi_in = MidiInput::new("phasorgate-port-lister")
        .map_err(|e| GateError::Midi(e.to_string()))?;
    let ports = midi_in.ports();
    Ok(ports
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect())
}

/// Timeline following an external MIDI clock device
pub struct MidiClockTimeline {
    follower: Arc<Mutex<ClockFollower>>,
    enabled: Arc<AtomicBool>,
    _connection: Mutex<MidiInputConnection<()>>,
}

impl MidiClockTimeline {
    /// Connects to the first input port whose name contains `device_name`.
    pub fn connect(device_name: &str) -> Result<Self> {
        let mut midi_in =
            MidiInput::new("phasorgate-clock").map_err(|e| GateError::Midi(e.to_string()))?;
        midi_in.ignore(Ignore::None);

        let in_ports = midi_in.ports();
        debug!("Available MIDI input ports:");
        for port in &in_ports {
            if let Ok(port_name) = midi_in.port_name(port) {
                debug!("  - {}", port_name);
            }
        }

        let in_port = in_ports
            .iter()
            .find(|port| {
                midi_in
                    .port_name(port)
                    .unwrap_or_default()
                    .contains(device_name)
            })
            .ok_or_else(|| {
                GateError::Midi(format!("MIDI input device '{}' not found", device_name))
            })?;

        info!("Found MIDI clock device matching '{}', connecting", device_name);

        let follower = Arc::new(Mutex::new(ClockFollower::new()));
        let enabled = Arc::new(AtomicBool::new(false));

        let callback_follower = Arc::clone(&follower);
        let callback_enabled = Arc::clone(&enabled);
        let connection = midi_in
            .connect(
                in_port,
                "phasorgate-clock-in",
                move |_stamp, message, _| {
                    let at = Instant::now();
                    if !callback_enabled.load(Ordering::Acquire) {
                        return;
                    }
                    if let Some(msg) = ClockMessage::parse(message) {
                        match callback_follower.lock() {
                            Ok(mut follower) => follower.handle_message(msg, at),
                            Err(_) => warn!("MIDI clock follower lock poisoned"),
                        }
                    }
                },
                (),
            )
            .map_err(|e| GateError::Midi(e.to_string()))?;

        info!("Connected to MIDI clock device");
        Ok(Self {
            follower,
            enabled,
            _connection: Mutex::new(connection),
        })
    }
}

impl Timeline for MidiClockTimeline {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn snapshot(&self, at: Instant, quantum: f64) -> TimelineSnapshot {
        match self.follower.lock() {
            Ok(follower) => follower.snapshot(at, quantum),
            Err(poisoned) => poisoned.into_inner().snapshot(at, quantum),
        }
    }

    fn enable(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        info!(
            "MIDI clock timeline {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tick spacing for 120 BPM: 0.5 s per beat / 24
    const TICK_120: Duration = Duration::from_micros(20_833);

    fn feed_ticks(follower: &mut ClockFollower, start: Instant, count: u32) -> Instant {
        let mut at = start;
        for _ in 0..count {
            follower.handle_message(ClockMessage::Tick, at);
            at += TICK_120;
        }
        at - TICK_120
    }

    #[test]
    fn test_parse_messages() {
        assert_eq!(ClockMessage::parse(&[0xF8]), Some(ClockMessage::Tick));
        assert_eq!(ClockMessage::parse(&[0xFA]), Some(ClockMessage::Start));
        assert_eq!(ClockMessage::parse(&[0xFB]), Some(ClockMessage::Continue));
        assert_eq!(ClockMessage::parse(&[0xFC]), Some(ClockMessage::Stop));
        assert_eq!(
            ClockMessage::parse(&[0xF2, 0x10, 0x01]),
            Some(ClockMessage::SongPosition(144))
        );
        assert_eq!(ClockMessage::parse(&[0x90, 60, 100]), None);
        assert_eq!(ClockMessage::parse(&[]), None);
    }

    #[test]
    fn test_default_tempo_before_ticks() {
        let follower = ClockFollower::new();
        let snapshot = follower.snapshot(Instant::now(), 4.0);
        assert_eq!(snapshot.tempo, 120.0);
        assert_eq!(snapshot.beat, 0.0);
    }

    #[test]
    fn test_tempo_estimate_from_ticks() {
        let mut follower = ClockFollower::new();
        follower.handle_message(ClockMessage::Start, Instant::now());
        feed_ticks(&mut follower, Instant::now(), 30);
        assert!((follower.tempo() - 120.0).abs() < 0.1);
    }

    #[test]
    fn test_position_counts_from_start() {
        let start = Instant::now();
        let mut follower = ClockFollower::new();
        follower.handle_message(ClockMessage::Start, start);

        // First tick after Start is beat zero, 25th tick is beat one
        let last = feed_ticks(&mut follower, start, 25);
        let beat = follower.beat_at(last);
        assert!((beat - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_is_capped_at_next_tick() {
        let start = Instant::now();
        let mut follower = ClockFollower::new();
        follower.handle_message(ClockMessage::Start, start);
        let last = feed_ticks(&mut follower, start, 10);

        let halfway = follower.beat_at(last + TICK_120 / 2);
        assert!(halfway > 9.0 / 24.0 && halfway < 10.0 / 24.0);

        let late = follower.beat_at(last + Duration::from_secs(2));
        assert!((late - 10.0 / 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_freezes_position() {
        let start = Instant::now();
        let mut follower = ClockFollower::new();
        follower.handle_message(ClockMessage::Start, start);
        let last = feed_ticks(&mut follower, start, 13);
        follower.handle_message(ClockMessage::Stop, last);

        let frozen = follower.beat_at(last);
        follower.handle_message(ClockMessage::Tick, last + TICK_120);
        assert_eq!(follower.beat_at(last + TICK_120 * 5), frozen);
        assert!(!follower.is_playing());
    }

    #[test]
    fn test_song_position_relocates() {
        let start = Instant::now();
        let mut follower = ClockFollower::new();
        follower.handle_message(ClockMessage::SongPosition(16), start);
        follower.handle_message(ClockMessage::Continue, start);
        follower.handle_message(ClockMessage::Tick, start);

        // 16 sixteenths = 4 beats, phase wraps to 0 in a 4 beat quantum
        let snapshot = follower.snapshot(start, 4.0);
        assert!((snapshot.beat - 4.0).abs() < 1e-9);
        assert!(snapshot.phase.abs() < 1e-9);
    }

    #[test]
    fn test_long_gap_resets_tempo_window() {
        let start = Instant::now();
        let mut follower = ClockFollower::new();
        let last = feed_ticks(&mut follower, start, 10);

        follower.handle_message(ClockMessage::Tick, last + Duration::from_secs(3));
        assert_eq!(follower.intervals.len(), 0);
        assert!((follower.tempo() - 120.0).abs() < 0.1);
    }
}
