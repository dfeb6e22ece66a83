//! Error types for hardware operations.
//!
//! A peripheral fails by not answering, by a bus error, or by being asked for
//! something outside its range.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Display write outside the character grid.
    #[error("Invalid display position: row {row}, column {column}")]
    InvalidPosition { row: u8, column: u8 },

    /// Actuator asked to move outside its travel.
    #[error("Angle {degrees} out of range (max {max})")]
    AngleOutOfRange { degrees: u8, max: u8 },
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }
}
