use super::{Timeline, TimelineSnapshot};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Free-running timeline at a fixed tempo
///
/// Beat zero is the instant the timeline was created.
pub struct InternalTimeline {
    tempo: f64,
    origin: Instant,
    enabled: AtomicBool,
}

impl InternalTimeline {
    pub fn new(tempo: f64) -> Self {
        Self::starting_at(tempo, Instant::now())
    }

    pub fn starting_at(tempo: f64, origin: Instant) -> Self {
        info!("Creating internal timeline at {} BPM", tempo);
        Self {
            tempo,
            origin,
            enabled: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    fn beat_at(&self, at: Instant) -> f64 {
        let beats_per_second = self.tempo / 60.0;
        match at.checked_duration_since(self.origin) {
            Some(elapsed) => elapsed.as_secs_f64() * beats_per_second,
            None => -(self.origin.duration_since(at).as_secs_f64() * beats_per_second),
        }
    }
}

impl Timeline for InternalTimeline {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn snapshot(&self, at: Instant, quantum: f64) -> TimelineSnapshot {
        TimelineSnapshot::at_beat(self.tempo, self.beat_at(at), quantum)
    }

    fn enable(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        info!(
            "Internal timeline {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }
}
