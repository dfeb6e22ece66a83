//! The device store: fitted hardware plus the state snapshot.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use homestation_core::{Error, Result};
use homestation_hardware::{
    AnalogInput, DigitalInput, DigitalOutput, HardwareError, PositionActuator,
    TemperatureHumiditySensor,
};

use crate::scaling::{gas_level, servo_angle, water_level};
use crate::state::{DeviceState, Snapshot};

/// Store shared between the poll loop and the request handlers.
pub type SharedDeviceStore = Arc<Mutex<DeviceStore>>;

fn hardware(e: HardwareError) -> Error {
    Error::HardwareError(e.to_string())
}

/// Owner of the board's sensors, actuators and [`DeviceState`].
///
/// # Thread Safety
///
/// This struct is not synchronised. Share it as a [`SharedDeviceStore`].
pub struct DeviceStore {
    state: DeviceState,
    climate: Box<dyn TemperatureHumiditySensor>,
    gas: Box<dyn AnalogInput>,
    water: Option<Box<dyn AnalogInput>>,
    rain: Option<Box<dyn DigitalInput>>,
    motion: Box<dyn DigitalInput>,
    led: Box<dyn DigitalOutput>,
    door: Option<Box<dyn PositionActuator>>,
    tender: Option<Box<dyn PositionActuator>>,
}

impl DeviceStore {
    /// Create a builder for fitting devices.
    pub fn builder() -> DeviceStoreBuilder {
        DeviceStoreBuilder::default()
    }

    /// Wrap the store for sharing between tasks.
    pub fn into_shared(self) -> SharedDeviceStore {
        Arc::new(Mutex::new(self))
    }

    /// Drive actuators to their rest positions and take a first reading.
    ///
    /// # Errors
    ///
    /// Returns an error if an actuator rejects its rest command.
    pub fn initialize(&mut self) -> Result<Snapshot> {
        self.set_led(false)?;
        if self.door.is_some() {
            self.set_door(false)?;
        }
        if self.tender.is_some() {
            self.set_tender(false)?;
        }

        let snapshot = self.refresh_sensors();
        info!(
            water = self.water.is_some(),
            rain = self.rain.is_some(),
            door = self.door.is_some(),
            tender = self.tender.is_some(),
            "Device store initialized"
        );
        Ok(snapshot)
    }

    /// Re-read every fitted sensor and return the updated snapshot.
    ///
    /// A climate read that fails, or that comes back with either field NaN,
    /// keeps the previous temperature and humidity. Any other sensor that
    /// cannot be read also keeps its previous value. Nothing is reported to
    /// the caller beyond a `warn` event.
    pub fn refresh_sensors(&mut self) -> Snapshot {
        match self.climate.read() {
            Ok(reading) if reading.is_valid() => {
                self.state.temperature = reading.temperature;
                self.state.humidity = reading.humidity;
            }
            Ok(_) => warn!("Climate sensor returned an invalid reading, keeping last value"),
            Err(e) => warn!(error = %e, "Climate sensor read failed, keeping last value"),
        }

        match self.gas.read_raw() {
            Ok(raw) => self.state.gas_level = gas_level(raw),
            Err(e) => warn!(error = %e, "Gas sensor read failed"),
        }

        if let Some(water) = self.water.as_mut() {
            match water.read_raw() {
                Ok(raw) => self.state.water_level = water_level(raw),
                Err(e) => warn!(error = %e, "Water sensor read failed"),
            }
        }

        // Rain sensor pulls its output low when wet
        if let Some(rain) = self.rain.as_mut() {
            match rain.is_high() {
                Ok(high) => self.state.rain = !high,
                Err(e) => warn!(error = %e, "Rain sensor read failed"),
            }
        }

        match self.motion.is_high() {
            Ok(high) => self.state.motion = high,
            Err(e) => warn!(error = %e, "Motion sensor read failed"),
        }

        debug!(
            temp = self.state.temperature,
            hum = self.state.humidity,
            gas = self.state.gas_level,
            motion = self.state.motion,
            "Sensors refreshed"
        );

        self.snapshot()
    }

    /// Switch the LED and record the commanded state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HardwareError`] if the pin write fails; the recorded
    /// state is left unchanged.
    pub fn set_led(&mut self, on: bool) -> Result<bool> {
        self.led.set_state(on).map_err(hardware)?;
        self.state.led_on = on;
        debug!(on, "LED commanded");
        Ok(on)
    }

    /// Open or close the door and record the commanded state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActuatorNotFitted`] on boards without a door servo,
    /// or [`Error::HardwareError`] if the servo rejects the command.
    pub fn set_door(&mut self, open: bool) -> Result<bool> {
        let door = self
            .door
            .as_mut()
            .ok_or_else(|| Error::ActuatorNotFitted("door".into()))?;
        door.write_angle(servo_angle(open)).map_err(hardware)?;
        self.state.door_open = open;
        debug!(open, "Door commanded");
        Ok(open)
    }

    /// Extend or retract the tender and record the commanded state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActuatorNotFitted`] on boards without a tender servo,
    /// or [`Error::HardwareError`] if the servo rejects the command.
    pub fn set_tender(&mut self, extended: bool) -> Result<bool> {
        let tender = self
            .tender
            .as_mut()
            .ok_or_else(|| Error::ActuatorNotFitted("tender".into()))?;
        tender.write_angle(servo_angle(extended)).map_err(hardware)?;
        self.state.tender_extended = extended;
        debug!(extended, "Tender commanded");
        Ok(extended)
    }

    /// Current state without touching any hardware.
    pub fn snapshot(&self) -> Snapshot {
        let s = &self.state;
        Snapshot {
            temperature: s.temperature,
            humidity: s.humidity,
            gas_level: s.gas_level,
            rain: self.rain.as_ref().map(|_| s.rain),
            water_level: self.water.as_ref().map(|_| s.water_level),
            motion: s.motion,
            led_on: s.led_on,
            door_open: self.door.as_ref().map(|_| s.door_open),
            tender_extended: self.tender.as_ref().map(|_| s.tender_extended),
        }
    }

    /// Full state, including fields for devices that are not fitted.
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// A door servo is fitted.
    pub fn has_door(&self) -> bool {
        self.door.is_some()
    }

    /// A tender servo is fitted.
    pub fn has_tender(&self) -> bool {
        self.tender.is_some()
    }
}

/// Builder for [`DeviceStore`].
///
/// The climate sensor, gas channel, motion input and LED are required; the
/// rest depend on the board variant.
#[derive(Default)]
pub struct DeviceStoreBuilder {
    climate: Option<Box<dyn TemperatureHumiditySensor>>,
    gas: Option<Box<dyn AnalogInput>>,
    water: Option<Box<dyn AnalogInput>>,
    rain: Option<Box<dyn DigitalInput>>,
    motion: Option<Box<dyn DigitalInput>>,
    led: Option<Box<dyn DigitalOutput>>,
    door: Option<Box<dyn PositionActuator>>,
    tender: Option<Box<dyn PositionActuator>>,
}

impl DeviceStoreBuilder {
    /// Fit the temperature/humidity sensor.
    pub fn with_climate(mut self, sensor: impl TemperatureHumiditySensor + 'static) -> Self {
        self.climate = Some(Box::new(sensor));
        self
    }

    /// Fit the gas sensor channel.
    pub fn with_gas(mut self, channel: impl AnalogInput + 'static) -> Self {
        self.gas = Some(Box::new(channel));
        self
    }

    /// Fit the water level channel.
    pub fn with_water(mut self, channel: impl AnalogInput + 'static) -> Self {
        self.water = Some(Box::new(channel));
        self
    }

    /// Fit the rain sensor input.
    pub fn with_rain(mut self, input: impl DigitalInput + 'static) -> Self {
        self.rain = Some(Box::new(input));
        self
    }

    /// Fit the motion sensor input.
    pub fn with_motion(mut self, input: impl DigitalInput + 'static) -> Self {
        self.motion = Some(Box::new(input));
        self
    }

    /// Fit the LED output.
    pub fn with_led(mut self, output: impl DigitalOutput + 'static) -> Self {
        self.led = Some(Box::new(output));
        self
    }

    /// Fit the door servo.
    pub fn with_door(mut self, servo: impl PositionActuator + 'static) -> Self {
        self.door = Some(Box::new(servo));
        self
    }

    /// Fit the tender servo.
    pub fn with_tender(mut self, servo: impl PositionActuator + 'static) -> Self {
        self.tender = Some(Box::new(servo));
        self
    }

    /// Build the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required device was not fitted.
    pub fn build(self) -> Result<DeviceStore> {
        fn required<T>(device: Option<T>, name: &str) -> Result<T> {
            device.ok_or_else(|| Error::Config(format!("device store needs a {name}")))
        }

        Ok(DeviceStore {
            state: DeviceState::default(),
            climate: required(self.climate, "climate sensor")?,
            gas: required(self.gas, "gas sensor")?,
            water: self.water,
            rain: self.rain,
            motion: required(self.motion, "motion sensor")?,
            led: required(self.led, "LED output")?,
            door: self.door,
            tender: self.tender,
        })
    }
}
