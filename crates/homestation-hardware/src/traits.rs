//! Capability trait definitions.
//!
//! These traits establish the contract between the station core and its
//! peripherals. They are object-safe so the device store can hold a
//! `Box<dyn AnalogInput + Send>` for whichever channels a board has fitted.

use crate::error::Result;
use crate::types::ClimateReading;

/// Combined temperature and relative humidity sensor.
pub trait TemperatureHumiditySensor: Send {
    /// Take one sample.
    ///
    /// A conversion the sensor itself flags as failed comes back as a
    /// reading with NaN fields (see [`ClimateReading::is_valid`]), not as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor cannot be reached at all.
    fn read(&mut self) -> Result<ClimateReading>;
}

/// One channel of a 12-bit analog-to-digital converter.
pub trait AnalogInput: Send {
    /// Read the raw conversion result, `0..=4095`.
    fn read_raw(&mut self) -> Result<u16>;
}

/// A digital input pin.
pub trait DigitalInput: Send {
    /// `true` when the pin reads high.
    fn is_high(&mut self) -> Result<bool>;
}

/// A digital output pin.
pub trait DigitalOutput: Send {
    /// Drive the pin high (`true`) or low (`false`).
    fn set_state(&mut self, high: bool) -> Result<()>;
}

/// A servo or similar actuator commanded by angle.
pub trait PositionActuator: Send {
    /// Move to `degrees`.
    ///
    /// # Errors
    ///
    /// Returns an error if the angle is outside the actuator's travel or
    /// the command cannot be delivered.
    fn write_angle(&mut self, degrees: u8) -> Result<()>;
}

/// A character display addressed by row and column.
///
/// # Examples
///
/// ```
/// use homestation_hardware::{TextDisplay, VirtualLcd};
///
/// let mut lcd = VirtualLcd::new(2, 16);
/// lcd.clear().unwrap();
/// lcd.write_at(0, 0, "ENTER CODE:").unwrap();
/// assert_eq!(lcd.line(0).unwrap().trim_end(), "ENTER CODE:");
/// ```
pub trait TextDisplay: Send {
    /// Number of text rows.
    fn rows(&self) -> u8;

    /// Number of characters per row.
    fn columns(&self) -> u8;

    /// Blank the whole display.
    fn clear(&mut self) -> Result<()>;

    /// Write `text` starting at `row`, `column`.
    ///
    /// Text running past the end of the row is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the start position lies outside the display.
    fn write_at(&mut self, row: u8, column: u8, text: &str) -> Result<()>;
}

/// A scanned matrix keypad.
pub trait MatrixKeypad: Send {
    /// Return the key pressed since the last poll, if any.
    ///
    /// Never blocks; most polls return `None`.
    fn poll_key(&mut self) -> Option<char>;
}
