//! Mock temperature/humidity sensor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::traits::TemperatureHumiditySensor;
use crate::types::ClimateReading;
use crate::{HardwareError, Result};

#[derive(Debug)]
struct ClimateState {
    temperature_bits: AtomicU32,
    humidity_bits: AtomicU32,
    disconnected: AtomicBool,
}

/// Mock climate sensor returning whatever its handle last set.
///
/// # Examples
///
/// ```
/// use homestation_hardware::mock::MockClimateSensor;
/// use homestation_hardware::TemperatureHumiditySensor;
///
/// let (mut sensor, handle) = MockClimateSensor::new();
/// handle.set(24.0, 55.0);
///
/// let reading = sensor.read().unwrap();
/// assert_eq!(reading.temperature, 24.0);
///
/// handle.set_invalid();
/// assert!(!sensor.read().unwrap().is_valid());
/// ```
#[derive(Debug)]
pub struct MockClimateSensor {
    state: Arc<ClimateState>,
}

impl MockClimateSensor {
    /// Create a sensor reading 0 °C / 0 %.
    pub fn new() -> (Self, MockClimateHandle) {
        let state = Arc::new(ClimateState {
            temperature_bits: AtomicU32::new(0.0f32.to_bits()),
            humidity_bits: AtomicU32::new(0.0f32.to_bits()),
            disconnected: AtomicBool::new(false),
        });

        (
            Self {
                state: Arc::clone(&state),
            },
            MockClimateHandle { state },
        )
    }
}

impl TemperatureHumiditySensor for MockClimateSensor {
    fn read(&mut self) -> Result<ClimateReading> {
        if self.state.disconnected.load(Ordering::Acquire) {
            return Err(HardwareError::disconnected("Mock climate sensor"));
        }

        Ok(ClimateReading::new(
            f32::from_bits(self.state.temperature_bits.load(Ordering::Acquire)),
            f32::from_bits(self.state.humidity_bits.load(Ordering::Acquire)),
        ))
    }
}

/// Handle for controlling a mock climate sensor.
#[derive(Debug, Clone)]
pub struct MockClimateHandle {
    state: Arc<ClimateState>,
}

impl MockClimateHandle {
    /// Set the next reading.
    pub fn set(&self, temperature: f32, humidity: f32) {
        self.state
            .temperature_bits
            .store(temperature.to_bits(), Ordering::Release);
        self.state
            .humidity_bits
            .store(humidity.to_bits(), Ordering::Release);
    }

    /// Make the sensor return a failed (NaN) conversion.
    pub fn set_invalid(&self) {
        self.set(f32::NAN, f32::NAN);
    }

    /// Make the sensor unreachable (`true`) or reachable again (`false`).
    pub fn set_disconnected(&self, disconnected: bool) {
        self.state.disconnected.store(disconnected, Ordering::Release);
    }
}
