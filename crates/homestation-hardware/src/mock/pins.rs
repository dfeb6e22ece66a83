//! Mock analog and digital pins.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};

use crate::traits::{AnalogInput, DigitalInput, DigitalOutput};
use crate::{HardwareError, Result};

/// Shared level of a mock digital pin.
#[derive(Debug, Default)]
struct PinState {
    high: AtomicBool,
    faulted: AtomicBool,
    writes: AtomicUsize,
}

impl PinState {
    fn check(&self, what: &str) -> Result<()> {
        if self.faulted.load(Ordering::Acquire) {
            Err(HardwareError::communication(format!("{what} faulted")))
        } else {
            Ok(())
        }
    }
}

/// Mock ADC channel.
///
/// # Examples
///
/// ```
/// use homestation_hardware::mock::MockAnalogInput;
/// use homestation_hardware::AnalogInput;
///
/// let (mut channel, handle) = MockAnalogInput::new();
/// handle.set_raw(4095);
/// assert_eq!(channel.read_raw().unwrap(), 4095);
/// ```
#[derive(Debug)]
pub struct MockAnalogInput {
    raw: Arc<AtomicU16>,
    faulted: Arc<AtomicBool>,
}

impl MockAnalogInput {
    /// Create a channel reading 0.
    pub fn new() -> (Self, MockAnalogHandle) {
        let raw = Arc::new(AtomicU16::new(0));
        let faulted = Arc::new(AtomicBool::new(false));
        (
            Self {
                raw: Arc::clone(&raw),
                faulted: Arc::clone(&faulted),
            },
            MockAnalogHandle { raw, faulted },
        )
    }
}

impl AnalogInput for MockAnalogInput {
    fn read_raw(&mut self) -> Result<u16> {
        if self.faulted.load(Ordering::Acquire) {
            return Err(HardwareError::communication("ADC channel faulted"));
        }
        Ok(self.raw.load(Ordering::Acquire))
    }
}

/// Handle for driving a mock ADC channel.
#[derive(Debug, Clone)]
pub struct MockAnalogHandle {
    raw: Arc<AtomicU16>,
    faulted: Arc<AtomicBool>,
}

impl MockAnalogHandle {
    /// Set the raw conversion result the channel returns.
    pub fn set_raw(&self, raw: u16) {
        self.raw.store(raw, Ordering::Release);
    }

    /// Make reads fail (`true`) or succeed again (`false`).
    pub fn set_faulted(&self, faulted: bool) {
        self.faulted.store(faulted, Ordering::Release);
    }
}

/// Mock digital input pin.
#[derive(Debug)]
pub struct MockDigitalInput {
    state: Arc<PinState>,
}

impl MockDigitalInput {
    /// Create a pin reading low.
    pub fn new() -> (Self, MockInputHandle) {
        let state = Arc::new(PinState::default());
        (
            Self {
                state: Arc::clone(&state),
            },
            MockInputHandle { state },
        )
    }
}

impl DigitalInput for MockDigitalInput {
    fn is_high(&mut self) -> Result<bool> {
        self.state.check("Digital input")?;
        Ok(self.state.high.load(Ordering::Acquire))
    }
}

/// Handle for driving a mock digital input.
#[derive(Debug, Clone)]
pub struct MockInputHandle {
    state: Arc<PinState>,
}

impl MockInputHandle {
    /// Set the level the pin reads.
    pub fn set_high(&self, high: bool) {
        self.state.high.store(high, Ordering::Release);
    }

    /// Make reads fail (`true`) or succeed again (`false`).
    pub fn set_faulted(&self, faulted: bool) {
        self.state.faulted.store(faulted, Ordering::Release);
    }
}

/// Mock digital output pin.
///
/// # Examples
///
/// ```
/// use homestation_hardware::mock::MockOutputPin;
/// use homestation_hardware::DigitalOutput;
///
/// let (mut led, handle) = MockOutputPin::new();
/// led.set_state(true).unwrap();
/// assert!(handle.is_high());
/// ```
#[derive(Debug)]
pub struct MockOutputPin {
    state: Arc<PinState>,
}

impl MockOutputPin {
    /// Create a pin driven low.
    pub fn new() -> (Self, MockOutputHandle) {
        let state = Arc::new(PinState::default());
        (
            Self {
                state: Arc::clone(&state),
            },
            MockOutputHandle { state },
        )
    }
}

impl DigitalOutput for MockOutputPin {
    fn set_state(&mut self, high: bool) -> Result<()> {
        self.state.check("Digital output")?;
        self.state.high.store(high, Ordering::Release);
        self.state.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

/// Handle for observing a mock digital output.
#[derive(Debug, Clone)]
pub struct MockOutputHandle {
    state: Arc<PinState>,
}

impl MockOutputHandle {
    /// Level the pin is currently driven to.
    pub fn is_high(&self) -> bool {
        self.state.high.load(Ordering::Acquire)
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.state.writes.load(Ordering::Acquire)
    }

    /// Make writes fail (`true`) or succeed again (`false`).
    pub fn set_faulted(&self, faulted: bool) {
        self.state.faulted.store(faulted, Ordering::Release);
    }
}
