use super::{Direction, Level, Pin, PinDriver, PinError, Pull};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

/// Pin driver for the Linux sysfs GPIO interface
///
/// Value files are opened once in `configure` and kept open, so the hot
/// loops only seek and read or write a single byte.
pub struct SysfsPins {
    root: PathBuf,
    values: Mutex<HashMap<Pin, File>>,
}

impl SysfsPins {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        info!("Using sysfs GPIO at {}", root.display());
        Self {
            root,
            values: Mutex::new(HashMap::new()),
        }
    }

    fn pin_dir(&self, pin: Pin) -> PathBuf {
        self.root.join(format!("gpio{}", pin.0))
    }

    fn export(&self, pin: Pin) -> Result<(), PinError> {
        if self.pin_dir(pin).exists() {
            return Ok(());
        }

        debug!("Exporting GPIO {}", pin);
        write_file(pin, &self.root.join("export"), pin.0.to_string().as_bytes())?;

        // udev may take a moment to create the pin directory
        for _ in 0..50 {
            if self.pin_dir(pin).exists() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(10));
        }
        Err(PinError::new(pin, "export did not create a gpio directory"))
    }

    fn with_value_file<T>(
        &self,
        pin: Pin,
        f: impl FnOnce(&mut File) -> std::io::Result<T>,
    ) -> Result<T, PinError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| PinError::new(pin, "value file table poisoned"))?;
        let file = values
            .get_mut(&pin)
            .ok_or_else(|| PinError::new(pin, "not configured"))?;
        f(file).map_err(|e| PinError::new(pin, e.to_string()))
    }
}

fn write_file(pin: Pin, path: &Path, contents: &[u8]) -> Result<(), PinError> {
    fs::write(path, contents)
        .map_err(|e| PinError::new(pin, format!("writing {}: {}", path.display(), e)))
}

impl PinDriver for SysfsPins {
    fn configure(
        &self,
        pin: Pin,
        direction: Direction,
        pull: Option<Pull>,
    ) -> Result<(), PinError> {
        self.export(pin)?;

        let dir = self.pin_dir(pin);
        let direction_text: &[u8] = match direction {
            Direction::Input => b"in",
            Direction::Output => b"out",
        };
        write_file(pin, &dir.join("direction"), direction_text)?;

        if let Some(pull) = pull {
            if pull != Pull::Off {
                warn!(
                    "GPIO {}: sysfs cannot set a {:?} pull; configure it in the device tree",
                    pin, pull
                );
            }
        }

        let value_path = dir.join("value");
        let file = OpenOptions::new()
            .read(true)
            .write(direction == Direction::Output)
            .open(&value_path)
            .map_err(|e| PinError::new(pin, format!("opening {}: {}", value_path.display(), e)))?;

        self.values
            .lock()
            .map_err(|_| PinError::new(pin, "value file table poisoned"))?
            .insert(pin, file);

        info!("Configured GPIO {} as {:?}", pin, direction);
        Ok(())
    }

    fn write(&self, pin: Pin, level: Level) -> Result<(), PinError> {
        let byte: &[u8] = if level.is_high() { b"1" } else { b"0" };
        self.with_value_file(pin, |file| {
            file.seek(SeekFrom::Start(0))?;
            file.write_all(byte)
        })
    }

    fn read(&self, pin: Pin) -> Result<Level, PinError> {
        let byte = self.with_value_file(pin, |file| {
            let mut buf = [0u8; 1];
            file.seek(SeekFrom::Start(0))?;
            file.read_exact(&mut buf)?;
            Ok(buf[0])
        })?;

        match byte {
            b'1' => Ok(Level::High),
            b'0' => Ok(Level::Low),
            other => Err(PinError::new(
                pin,
                format!("unexpected value byte {:#04x}", other),
            )),
        }
    }
}
