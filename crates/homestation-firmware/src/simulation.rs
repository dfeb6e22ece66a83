//! Simulated board wiring.
//!
//! Builds the device store, keypad and LCD for a firmware variant out of the
//! mock devices, and keeps the handles that drive them.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use homestation_core::constants::{ADC_MAX, LCD_COLUMNS, LCD_ROWS};
use homestation_core::{FirmwareVariant, Result};
use homestation_device::DeviceStore;
use homestation_hardware::VirtualLcd;
use homestation_hardware::mock::*;

/// Handles for every simulated device on the board.
#[derive(Debug, Clone)]
pub struct SimulationHandles {
    pub climate: MockClimateHandle,
    pub gas: MockAnalogHandle,
    pub water: Option<MockAnalogHandle>,
    pub rain: Option<MockInputHandle>,
    pub motion: MockInputHandle,
    pub led: MockOutputHandle,
    pub door: Option<MockServoHandle>,
    pub tender: Option<MockServoHandle>,
    pub keypad: Option<MockKeypadHandle>,
}

impl SimulationHandles {
    /// Set readings for step `step` of a slow synthetic day.
    pub fn apply_drift(&self, step: u64) {
        let phase = step as f32 / 60.0;

        let temperature = 22.0 + 3.0 * phase.sin();
        let humidity = 50.0 + 10.0 * phase.cos();
        self.climate.set(
            (temperature * 10.0).round() / 10.0,
            humidity.round(),
        );

        self.gas.set_raw(400 + ((step * 37) % 200) as u16);
        self.motion.set_high(step % 40 < 5);

        if let Some(rain) = &self.rain {
            // Active low: wet for 20 steps out of every 300
            rain.set_high(step % 300 >= 20);
        }
        if let Some(water) = &self.water {
            let dry = ADC_MAX as u64;
            water.set_raw((dry - (step * 11) % (dry / 2)) as u16);
        }
    }
}

/// A board assembled from mock devices.
pub struct SimulatedBoard {
    pub store: DeviceStore,
    pub keypad: Option<MockKeypad>,
    pub lcd: Option<VirtualLcd>,
    pub handles: SimulationHandles,
}

impl SimulatedBoard {
    /// Fit the devices `variant` has.
    ///
    /// # Errors
    ///
    /// Returns an error if the device store rejects the fitted set.
    pub fn new(variant: FirmwareVariant) -> Result<Self> {
        let (climate, climate_handle) = MockClimateSensor::new();
        let (gas, gas_handle) = MockAnalogInput::new();
        let (motion, motion_handle) = MockDigitalInput::new();
        let (led, led_handle) = MockOutputPin::new();

        let mut builder = DeviceStore::builder()
            .with_climate(climate)
            .with_gas(gas)
            .with_motion(motion)
            .with_led(led);

        let water = if variant.has_water_sensor() {
            let (water, handle) = MockAnalogInput::new();
            // A dry probe reads full scale
            handle.set_raw(ADC_MAX as u16);
            builder = builder.with_water(water);
            Some(handle)
        } else {
            None
        };

        let rain = if variant.has_rain_sensor() {
            let (rain, handle) = MockDigitalInput::new();
            handle.set_high(true);
            builder = builder.with_rain(rain);
            Some(handle)
        } else {
            None
        };

        let (door, tender) = if variant.has_servos() {
            let (door, door_handle) = MockServo::new();
            let (tender, tender_handle) = MockServo::new();
            builder = builder.with_door(door).with_tender(tender);
            (Some(door_handle), Some(tender_handle))
        } else {
            (None, None)
        };

        let (keypad, keypad_handle, lcd) = if variant.has_keypad() {
            let (keypad, handle) = MockKeypad::new();
            (
                Some(keypad),
                Some(handle),
                Some(VirtualLcd::new(LCD_ROWS, LCD_COLUMNS)),
            )
        } else {
            (None, None, None)
        };

        let store = builder.build()?;
        debug!(%variant, "Simulated board assembled");

        Ok(Self {
            store,
            keypad,
            lcd,
            handles: SimulationHandles {
                climate: climate_handle,
                gas: gas_handle,
                water,
                rain,
                motion: motion_handle,
                led: led_handle,
                door,
                tender,
                keypad: keypad_handle,
            },
        })
    }
}

/// Drift the simulated readings every `period` until shutdown.
pub fn spawn_drift(
    handles: SimulationHandles,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        let mut step = 0u64;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    handles.apply_drift(step);
                    step += 1;
                }
                _ = shutdown.changed() => break,
            }
        }
    })
}
