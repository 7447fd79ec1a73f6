//! Gate engine: the polling loops and the state they share
//!
//! Three loops run on their own threads, each with a fixed sleep between
//! iterations:
//! - output loop (fast): timeline snapshot -> pulse gates -> output pins
//! - input loop: transport button -> press transitions
//! - status loop: timeline snapshot -> console display
//!
//! The loops borrow one [`Engine`] through a `crossbeam` scope. The only
//! mutable state they share is the transport and the running flag, both
//! atomics. Shutdown is cooperative: each loop checks the running flag once
//! per iteration, and the first loop to fail or panic clears it for everyone.

use crate::config::Settings;
use crate::error::{GateError, Result};
use crate::input::InputPoller;
use crate::output::OutputDriver;
use crate::pins::{Direction, Level, PinDriver};
use crate::timeline::Timeline;
use crate::transport::SharedTransport;
use crate::ui::StatusDisplay;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const SUPERVISOR_PERIOD: Duration = Duration::from_millis(10);

/// Clears the running flag if a loop thread unwinds, so a panic stops the
/// other loops and the supervisor the same way an error does.
struct ShutdownOnPanic<'a> {
    engine: &'a Engine,
    name: &'static str,
}

impl Drop for ShutdownOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("{} loop panicked", self.name);
            self.engine.shutdown();
        }
    }
}

pub struct Engine {
    settings: Settings,
    timeline: Box<dyn Timeline>,
    pins: Box<dyn PinDriver>,
    transport: SharedTransport,
    running: AtomicBool,
    show_status: bool,
}

impl Engine {
    /// Creates an engine after validating `settings`.
    pub fn new(
        settings: Settings,
        timeline: Box<dyn Timeline>,
        pins: Box<dyn PinDriver>,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            timeline,
            pins,
            transport: SharedTransport::new(),
            running: AtomicBool::new(true),
            show_status: true,
        })
    }

    pub fn with_status_display(mut self, visible: bool) -> Self {
        self.show_status = visible;
        self
    }

    pub fn transport(&self) -> &SharedTransport {
        &self.transport
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Asks every loop to exit after its current iteration.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("Shutdown requested");
        }
    }

    /// Sets up the output pins and the button input. Call once before `run`.
    pub fn configure_pins(&self) -> Result<()> {
        let assignments = self.settings.pins;
        for pin in assignments.outputs() {
            self.pins.configure(pin, Direction::Output, None)?;
        }
        self.pins.configure(
            assignments.button(),
            Direction::Input,
            Some(self.settings.button_pull),
        )?;
        info!(
            "Pins configured: clock={} reset={} indicator={} button={}",
            assignments.clock, assignments.reset, assignments.indicator, assignments.button
        );
        Ok(())
    }

    /// Runs the loops until shutdown, a fatal error, or `run_for` elapses.
    ///
    /// Outputs are driven low and the timeline disabled before returning.
    pub fn run(&self, run_for: Option<Duration>) -> Result<()> {
        info!("Gate engine starting");
        self.timeline.enable(true);
        let deadline = run_for.map(|duration| Instant::now() + duration);

        let results = crossbeam::thread::scope(|scope| {
            let output = scope.spawn(|_| self.guarded("Output", || self.run_output_loop()));
            let input = scope.spawn(|_| self.guarded("Input", || self.run_input_loop()));
            let status = scope.spawn(|_| self.guarded("Status", || self.run_status_loop()));

            self.supervise(deadline);

            [
                ("output", output.join()),
                ("input", input.join()),
                ("status", status.join()),
            ]
        })
        .map_err(|_| GateError::Thread("loop scope panicked".to_string()))?;

        self.release_outputs();
        self.timeline.enable(false);
        info!("Gate engine stopped");

        let mut first_error = None;
        for (name, result) in results {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(_) => Err(GateError::Thread(format!("{} loop panicked", name))),
            };
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn supervise(&self, deadline: Option<Instant>) {
        while self.is_running() {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                info!("Run duration elapsed");
                self.shutdown();
                break;
            }
            thread::sleep(SUPERVISOR_PERIOD);
        }
    }

    fn guarded<F>(&self, name: &'static str, body: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        let _guard = ShutdownOnPanic { engine: self, name };
        body()
    }

    fn run_periodic<F>(&self, name: &str, period: Duration, mut step: F) -> Result<()>
    where
        F: FnMut() -> Result<()>,
    {
        info!("{} loop started, period {:?}", name, period);
        while self.is_running() {
            if let Err(e) = step() {
                error!("{} loop failed: {}", name, e);
                self.shutdown();
                return Err(e);
            }
            thread::sleep(period);
        }
        info!("{} loop stopped", name);
        Ok(())
    }

    fn run_output_loop(&self) -> Result<()> {
        let driver = OutputDriver::new(
            self.pins.as_ref(),
            self.timeline.as_ref(),
            &self.transport,
            &self.settings,
        );
        self.run_periodic("Output", self.settings.output_period(), || {
            driver.step().map(|_| ())
        })
    }

    fn run_input_loop(&self) -> Result<()> {
        let mut poller = match InputPoller::new(
            self.pins.as_ref(),
            &self.transport,
            self.settings.pins.button(),
            self.settings.button_active_low,
        ) {
            Ok(poller) => poller,
            Err(e) => {
                error!("Input loop could not start: {}", e);
                self.shutdown();
                return Err(e);
            }
        };
        self.run_periodic("Input", self.settings.input_period(), || {
            poller.poll().map(|_| ())
        })
    }

    fn run_status_loop(&self) -> Result<()> {
        let display = StatusDisplay::new(self.settings.quantum, self.show_status);
        let result = self.run_periodic("Status", self.settings.status_period(), || {
            let snapshot = self.timeline.capture(self.settings.quantum);
            display.render(&snapshot, self.transport.state());
            Ok(())
        });
        display.finish();
        result
    }

    fn release_outputs(&self) {
        for pin in self.settings.pins.outputs() {
            if let Err(e) = self.pins.write(pin, Level::Low) {
                warn!("Could not drive pin {} low on shutdown: {}", pin, e);
            }
        }
    }
}
