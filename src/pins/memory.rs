use super::{Direction, Level, Pin, PinDriver, PinError, Pull};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy)]
struct PinSlot {
    direction: Direction,
    level: Level,
    writes: u64,
    reads: u64,
}

/// Pin driver that only remembers levels
#[derive(Debug, Default)]
pub struct MemoryPins {
    slots: Mutex<HashMap<Pin, PinSlot>>,
}

impl MemoryPins {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Pin, PinSlot>> {
        match self.slots.lock() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Simulates an external signal on an input pin.
    pub fn set_input(&self, pin: Pin, level: Level) -> Result<(), PinError> {
        match self.slots().get_mut(&pin) {
            Some(slot) if slot.direction == Direction::Input => {
                slot.level = level;
                Ok(())
            }
            Some(_) => Err(PinError::new(pin, "not an input")),
            None => Err(PinError::new(pin, "not configured")),
        }
    }

    /// Last level written to or injected on a pin.
    pub fn level(&self, pin: Pin) -> Option<Level> {
        self.slots().get(&pin).map(|slot| slot.level)
    }

    pub fn write_count(&self, pin: Pin) -> u64 {
        self.slots().get(&pin).map_or(0, |slot| slot.writes)
    }

    pub fn read_count(&self, pin: Pin) -> u64 {
        self.slots().get(&pin).map_or(0, |slot| slot.reads)
    }
}

impl PinDriver for MemoryPins {
    fn configure(
        &self,
        pin: Pin,
        direction: Direction,
        pull: Option<Pull>,
    ) -> Result<(), PinError> {
        let level = match (direction, pull) {
            (Direction::Input, Some(Pull::Up)) => Level::High,
            _ => Level::Low,
        };
        self.slots().insert(
            pin,
            PinSlot {
                direction,
                level,
                writes: 0,
                reads: 0,
            },
        );
        Ok(())
    }

    fn write(&self, pin: Pin, level: Level) -> Result<(), PinError> {
        match self.slots().get_mut(&pin) {
            Some(slot) if slot.direction == Direction::Output => {
                slot.level = level;
                slot.writes += 1;
                Ok(())
            }
            Some(_) => Err(PinError::new(pin, "cannot write an input pin")),
            None => Err(PinError::new(pin, "not configured")),
        }
    }

    fn read(&self, pin: Pin) -> Result<Level, PinError> {
        match self.slots().get_mut(&pin) {
            Some(slot) => {
                slot.reads += 1;
                Ok(slot.level)
            }
            None => Err(PinError::new(pin, "not configured")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_back() {
        let pins = MemoryPins::new();
        pins.configure(Pin(22), Direction::Output, None).unwrap();
        pins.write(Pin(22), Level::High).unwrap();
        assert_eq!(pins.read(Pin(22)).unwrap(), Level::High);
        assert_eq!(pins.write_count(Pin(22)), 1);
    }

    #[test]
    fn test_unconfigured_pin_fails() {
        let pins = MemoryPins::new();
        assert!(pins.write(Pin(1), Level::High).is_err());
        assert!(pins.read(Pin(1)).is_err());
    }

    #[test]
    fn test_input_follows_pull_and_injection() {
        let pins = MemoryPins::new();
        pins.configure(Pin(25), Direction::Input, Some(Pull::Up))
            .unwrap();
        assert_eq!(pins.read(Pin(25)).unwrap(), Level::High);

        pins.set_input(Pin(25), Level::Low).unwrap();
        assert_eq!(pins.read(Pin(25)).unwrap(), Level::Low);
        assert!(pins.write(Pin(25), Level::High).is_err());
        assert_eq!(pins.read_count(Pin(25)), 2);
    }
}
