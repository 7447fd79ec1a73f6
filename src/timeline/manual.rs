use super::{phase_in_quantum, Timeline, TimelineSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Timeline whose tempo and beat are set by hand
///
/// Every snapshot reports the last values set, whatever instant is asked for.
pub struct ManualTimeline {
    position: Mutex<(f64, f64)>,
    enabled: AtomicBool,
}

impl ManualTimeline {
    pub fn new(tempo: f64, beat: f64) -> Self {
        Self {
            position: Mutex::new((tempo, beat)),
            enabled: AtomicBool::new(false),
        }
    }

    pub fn set(&self, tempo: f64, beat: f64) {
        if let Ok(mut position) = self.position.lock() {
            *position = (tempo, beat);
        }
    }

    pub fn set_beat(&self, beat: f64) {
        if let Ok(mut position) = self.position.lock() {
            position.1 = beat;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl Timeline for ManualTimeline {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn snapshot(&self, _at: Instant, quantum: f64) -> TimelineSnapshot {
        let (tempo, beat) = match self.position.lock() {
            Ok(position) => *position,
            Err(poisoned) => *poisoned.into_inner(),
        };
        TimelineSnapshot {
            tempo,
            beat,
            phase: phase_in_quantum(beat, quantum),
        }
    }

    fn enable(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}
