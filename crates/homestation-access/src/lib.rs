//! Keypad access controller.
//!
//! Keys from a matrix keypad accumulate into a code that is checked against
//! a stored credential when the submit key is pressed. The controller shows
//! the prompt, the entered code and the outcome on a [`TextDisplay`].
//!
//! The outcome stays on the display for a configured presentation time. That
//! pause is a timed state advanced by [`KeypadAccessController::tick`], so the
//! poll loop never blocks on it.
//!
//! [`TextDisplay`]: homestation_hardware::TextDisplay

pub mod controller;
pub mod keymap;

pub use controller::{
    AccessAttempt, AccessOutcome, AccessState, AccessStats, KeypadAccessController,
};
pub use keymap::{KeyAction, KeyMap};
