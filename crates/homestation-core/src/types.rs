use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Board build the station runs as.
///
/// The variant decides which sensors and actuators are fitted and, through
/// that, which fields `/data` reports and which control routes exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirmwareVariant {
    /// Climate, gas, water level, motion and the LED.
    Basic,
    /// Climate, gas, rain, motion, LED, door and tender servos, LCD and keypad.
    #[default]
    Full,
}

impl FirmwareVariant {
    /// Water level sensor is wired on this board.
    pub fn has_water_sensor(self) -> bool {
        matches!(self, Self::Basic)
    }

    /// Rain sensor is wired on this board.
    pub fn has_rain_sensor(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Door and tender servos are wired on this board.
    pub fn has_servos(self) -> bool {
        matches!(self, Self::Full)
    }

    /// LCD and keypad are wired on this board.
    pub fn has_keypad(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Board serves the web dashboard assets.
    pub fn serves_static(self) -> bool {
        matches!(self, Self::Full)
    }
}

impl fmt::Display for FirmwareVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Full => write!(f, "full"),
        }
    }
}

impl FromStr for FirmwareVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "full" => Ok(Self::Full),
            other => Err(Error::Config(format!("unknown firmware variant '{other}'"))),
        }
    }
}
