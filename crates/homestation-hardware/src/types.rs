//! Common types shared across capability traits.

/// One temperature/humidity sample.
///
/// Climate sensors signal a failed conversion by returning NaN for either
/// quantity rather than an error. [`is_valid`](Self::is_valid) tells the
/// two apart; consumers keep their previous sample when it returns `false`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    /// Degrees Celsius.
    pub temperature: f32,

    /// Relative humidity, percent.
    pub humidity: f32,
}

impl ClimateReading {
    /// Create a new reading.
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
        }
    }

    /// A reading flagged invalid by the sensor.
    pub fn invalid() -> Self {
        Self::new(f32::NAN, f32::NAN)
    }

    /// Both quantities hold a number.
    pub fn is_valid(&self) -> bool {
        !self.temperature.is_nan() && !self.humidity.is_nan()
    }
}
