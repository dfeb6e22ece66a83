//! Device state store for the station.
//!
//! The store owns the board's sensors and actuators together with the one
//! [`DeviceState`] snapshot the rest of the firmware reads. Sensor fields are
//! refreshed on demand; actuator fields always hold the last value that was
//! successfully commanded.
//!
//! The HTTP layer and the poll loop share one store through
//! [`SharedDeviceStore`], so every refresh and every command runs inside the
//! same lock.
//!
//! # Example
//!
//! ```
//! use homestation_device::DeviceStore;
//! use homestation_hardware::mock::*;
//!
//! let (climate, climate_handle) = MockClimateSensor::new();
//! let (gas, gas_handle) = MockAnalogInput::new();
//! let (motion, _) = MockDigitalInput::new();
//! let (led, led_handle) = MockOutputPin::new();
//!
//! let mut store = DeviceStore::builder()
//!     .with_climate(climate)
//!     .with_gas(gas)
//!     .with_motion(motion)
//!     .with_led(led)
//!     .build()
//!     .unwrap();
//!
//! climate_handle.set(22.5, 40.0);
//! gas_handle.set_raw(4095);
//!
//! let snapshot = store.refresh_sensors();
//! assert_eq!(snapshot.temperature, 22.5);
//! assert_eq!(snapshot.gas_level, 1000);
//!
//! store.set_led(true).unwrap();
//! assert!(led_handle.is_high());
//! assert!(store.snapshot().led_on);
//! ```

pub mod scaling;
pub mod state;
pub mod store;

pub use scaling::{gas_level, map_range, servo_angle, water_level};
pub use state::{DeviceState, Snapshot};
pub use store::{DeviceStore, DeviceStoreBuilder, SharedDeviceStore};
