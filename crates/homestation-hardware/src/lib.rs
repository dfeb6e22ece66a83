//! Hardware capability layer for the station firmware.
//!
//! The station core never touches pins directly. It talks to small
//! capability traits, one per kind of peripheral, so the device store and
//! the keypad access controller run unchanged against real drivers, the
//! mock devices in [`mock`], or the [`VirtualLcd`].
//!
//! # Capabilities
//!
//! | Trait | Peripheral |
//! |-------|------------|
//! | [`TemperatureHumiditySensor`] | DHT11 climate sensor |
//! | [`AnalogInput`] | 12-bit ADC channel (gas, water level) |
//! | [`DigitalInput`] | rain and motion sensors |
//! | [`DigitalOutput`] | status LED |
//! | [`PositionActuator`] | door and tender servos |
//! | [`TextDisplay`] | 16x2 character LCD |
//! | [`MatrixKeypad`] | 4x4 matrix keypad |
//!
//! All capability methods are synchronous: the station calls them from a
//! cooperative poll loop or while holding the device store lock, and a
//! real driver completes each call in bounded time. Every trait requires
//! `Send` so devices can move into tokio tasks.
//!
//! # Example
//!
//! ```
//! use homestation_hardware::mock::MockAnalogInput;
//! use homestation_hardware::AnalogInput;
//!
//! let (mut gas, handle) = MockAnalogInput::new();
//! handle.set_raw(2048);
//! assert_eq!(gas.read_raw().unwrap(), 2048);
//! ```

pub mod error;
pub mod lcd;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use lcd::VirtualLcd;
pub use traits::{
    AnalogInput, DigitalInput, DigitalOutput, MatrixKeypad, PositionActuator,
    TemperatureHumiditySensor, TextDisplay,
};
pub use types::ClimateReading;
