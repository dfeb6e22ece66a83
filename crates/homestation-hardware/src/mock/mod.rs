//! Mock device implementations for testing and host simulation.
//!
//! Each mock comes paired with a handle. The device half is handed to the
//! station core; the handle stays with the test (or simulator) to set what
//! the device reads, inspect what it was commanded, or inject a fault.

pub mod climate;
pub mod keypad;
pub mod pins;
pub mod servo;

// Re-export commonly used types
pub use climate::{MockClimateHandle, MockClimateSensor};
pub use keypad::{MockKeypad, MockKeypadHandle};
pub use pins::{
    MockAnalogHandle, MockAnalogInput, MockDigitalInput, MockInputHandle, MockOutputHandle,
    MockOutputPin,
};
pub use servo::{MockServo, MockServoHandle};
