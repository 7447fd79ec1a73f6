extern crate phasorgate;

use phasorgate::pins::{Direction, Level, MemoryPins, Pin, PinDriver, PinError, Pull};
use phasorgate::timeline::ManualTimeline;
use phasorgate::{Engine, GateError, Settings, Timeline, TransportState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

fn test_settings() -> Settings {
    Settings {
        pulses_per_beat: 4.0,
        pulse_width_seconds: 0.015,
        output_period_us: 250,
        input_period_ms: 1,
        status_period_ms: 5,
        ..Settings::default()
    }
}

fn engine_with(
    settings: Settings,
    timeline: &Arc<ManualTimeline>,
    pins: &Arc<MemoryPins>,
) -> Engine {
    let timeline: Box<dyn Timeline> = Box::new(Arc::clone(timeline));
    let driver: Box<dyn PinDriver> = Box::new(Arc::clone(pins));
    let engine = Engine::new(settings, timeline, driver)
        .unwrap()
        .with_status_display(false);
    engine.configure_pins().unwrap();
    engine
}

/// Stops the engine when dropped, so a failed assertion cannot leave the
/// loops running and the test binary hung.
struct StopOnDrop<'a>(&'a Engine);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.shutdown();
    }
}

/// Memory pins whose first write panics
struct PanicOnFirstWrite {
    inner: MemoryPins,
    armed: AtomicBool,
}

impl PinDriver for PanicOnFirstWrite {
    fn configure(
        &self,
        pin: Pin,
        direction: Direction,
        pull: Option<Pull>,
    ) -> Result<(), PinError> {
        self.inner.configure(pin, direction, pull)
    }

    fn write(&self, pin: Pin, level: Level) -> Result<(), PinError> {
        if self.armed.swap(false, Ordering::AcqRel) {
            panic!("pin {} write failed hard", pin);
        }
        self.inner.write(pin, level)
    }

    fn read(&self, pin: Pin) -> Result<Level, PinError> {
        self.inner.read(pin)
    }
}

fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn integration_test_cue_launch_and_stop() {
    let settings = test_settings();
    let button = settings.pins.button();
    let clock = settings.pins.clock();
    let timeline = Arc::new(ManualTimeline::new(120.0, 1.5));
    let pins = Arc::new(MemoryPins::new());
    let engine = engine_with(settings, &timeline, &pins);

    thread::scope(|s| {
        let runner = s.spawn(|| engine.run(None));
        let _stop = StopOnDrop(&engine);

        // The poller takes its baseline from the first read; press after it
        assert!(wait_for(|| pins.read_count(button) > 0));

        // Press: cued, nothing on the clock line yet
        pins.set_input(button, Level::High).unwrap();
        assert!(wait_for(|| engine.transport().state() == TransportState::Cued));
        pins.set_input(button, Level::Low).unwrap();
        thread::sleep(Duration::from_millis(10));
        assert_eq!(engine.transport().state(), TransportState::Cued);
        assert_eq!(pins.level(clock), Some(Level::Low));

        // Quantum boundary: launched with the first pulse
        timeline.set_beat(4.0025);
        assert!(wait_for(|| engine.transport().state() == TransportState::Playing));
        assert!(wait_for(|| pins.level(clock) == Some(Level::High)));

        timeline.set_beat(5.6);
        assert!(wait_for(|| pins.level(clock) == Some(Level::Low)));

        // Press again: stopped immediately, mid-quantum
        pins.set_input(button, Level::High).unwrap();
        assert!(wait_for(|| engine.transport().state() == TransportState::Stopped));
        timeline.set_beat(8.0);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(engine.transport().state(), TransportState::Stopped);
        assert_eq!(pins.level(clock), Some(Level::Low));

        engine.shutdown();
        runner.join().unwrap().unwrap();
    });

    assert!(!engine.is_running());
    assert!(!timeline.is_enabled());
}

#[test]
fn integration_test_run_for_stops_and_releases_outputs() {
    let settings = test_settings();
    let outputs = settings.pins.outputs();
    let timeline = Arc::new(ManualTimeline::new(120.0, 0.0));
    let pins = Arc::new(MemoryPins::new());
    let engine = engine_with(settings, &timeline, &pins);

    engine.transport().press();
    engine.run(Some(Duration::from_millis(50))).unwrap();

    assert_eq!(engine.transport().state(), TransportState::Playing);
    for pin in outputs {
        assert_eq!(pins.level(pin), Some(Level::Low));
        assert!(pins.write_count(pin) > 1);
    }
}

#[test]
fn integration_test_unusable_tempo_is_fatal() {
    let timeline = Arc::new(ManualTimeline::new(120.0, 0.0));
    let pins = Arc::new(MemoryPins::new());
    let engine = engine_with(test_settings(), &timeline, &pins);

    engine.transport().press();
    // The timeline reports a tempo at which 15 ms is more than a beat
    timeline.set(5000.0, 0.0);

    let result = engine.run(Some(Duration::from_secs(5)));
    assert!(matches!(result, Err(GateError::Pulse(_))));
    assert!(!engine.is_running());
}

#[test]
fn test_invalid_settings_rejected_before_start() {
    let settings = Settings {
        pulse_width_seconds: 0.5,
        ..Settings::default()
    };
    let timeline: Box<dyn Timeline> = Box::new(ManualTimeline::new(120.0, 0.0));
    let pins: Box<dyn PinDriver> = Box::new(MemoryPins::new());
    assert!(Engine::new(settings, timeline, pins).is_err());
}

#[test]
fn test_unconfigured_button_fails_input_loop() {
    let timeline: Box<dyn Timeline> = Box::new(ManualTimeline::new(120.0, 0.0));
    let pins: Box<dyn PinDriver> = Box::new(MemoryPins::new());
    let engine = Engine::new(test_settings(), timeline, pins)
        .unwrap()
        .with_status_display(false);

    // Nothing was configured, so the first pin access fails and stops every loop
    let result = engine.run(None);
    assert!(matches!(result, Err(GateError::Pin { .. })));
    assert!(!engine.is_running());
}

#[test]
fn integration_test_panicking_loop_stops_engine() {
    let settings = test_settings();
    let timeline: Box<dyn Timeline> = Box::new(ManualTimeline::new(120.0, 0.0));
    let pins: Box<dyn PinDriver> = Box::new(PanicOnFirstWrite {
        inner: MemoryPins::new(),
        armed: AtomicBool::new(true),
    });
    let engine = Arc::new(
        Engine::new(settings, timeline, pins)
            .unwrap()
            .with_status_display(false),
    );
    engine.configure_pins().unwrap();

    let (tx, rx) = mpsc::channel();
    let runner = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            let _ = tx.send(engine.run(None));
        })
    };

    let result = rx.recv_timeout(Duration::from_secs(5));
    engine.shutdown();
    runner.join().unwrap();

    match result {
        Ok(Err(GateError::Thread(message))) => assert!(message.contains("output")),
        other => panic!("expected a thread error, got {:?}", other),
    }
    assert!(!engine.is_running());
}
