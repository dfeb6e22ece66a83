//! Station firmware.
//!
//! Wires the device store, the keypad access controller and the HTTP API
//! together on a simulated board and runs them until shutdown.
//!
//! - [`SimulatedBoard`]: the boards' mock devices, fitted per variant
//! - [`Station`]: the cooperative poll loop for the keypad and sensor log
//! - [`Runtime`]: API server and poll loop started together
//! - [`spawn_line_reader`]: keypad input read from a line console

pub mod console;
pub mod runtime;
pub mod simulation;
pub mod station;

pub use console::{is_keypad_key, spawn_line_reader};
pub use runtime::{Runtime, SimulatedStation};
pub use simulation::{SimulatedBoard, SimulationHandles, spawn_drift};
pub use station::{AccessPanel, Station, format_reading};
