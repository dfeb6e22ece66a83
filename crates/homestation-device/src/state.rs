//! Device state snapshot.

use serde::Serialize;

/// Current sensor readings and actuator states.
///
/// Created with zero/false defaults at startup and mutated in place by the
/// [`DeviceStore`](crate::DeviceStore) for the rest of the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceState {
    /// Last valid temperature, °C.
    pub temperature: f32,

    /// Last valid relative humidity, percent.
    pub humidity: f32,

    /// Gas level, `0..=1000`.
    pub gas_level: i32,

    /// Water level, percent.
    pub water_level: i32,

    /// Rain detected.
    pub rain: bool,

    /// Motion detected.
    pub motion: bool,

    /// LED commanded on.
    pub led_on: bool,

    /// Door commanded open.
    pub door_open: bool,

    /// Tender commanded extended.
    pub tender_extended: bool,
}

/// Read-only view of a [`DeviceState`] as the API reports it.
///
/// Fields for devices the board does not have are `None` and left out of the
/// serialised object.
///
/// ```
/// use homestation_device::Snapshot;
///
/// let snapshot = Snapshot {
///     temperature: 25.5,
///     humidity: 60.0,
///     gas_level: 150,
///     rain: Some(false),
///     water_level: None,
///     motion: true,
///     led_on: false,
///     door_open: Some(false),
///     tender_extended: Some(false),
/// };
///
/// let json = serde_json::to_value(snapshot).unwrap();
/// assert_eq!(json["temp"], 25.5);
/// assert_eq!(json["tender_state"], false);
/// assert!(json.get("water").is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(rename = "temp")]
    pub temperature: f32,

    #[serde(rename = "hum")]
    pub humidity: f32,

    #[serde(rename = "gas")]
    pub gas_level: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rain: Option<bool>,

    #[serde(rename = "water", skip_serializing_if = "Option::is_none")]
    pub water_level: Option<i32>,

    pub motion: bool,

    #[serde(rename = "led_state")]
    pub led_on: bool,

    #[serde(rename = "door_state", skip_serializing_if = "Option::is_none")]
    pub door_open: Option<bool>,

    #[serde(rename = "tender_state", skip_serializing_if = "Option::is_none")]
    pub tender_extended: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_zeroed() {
        let state = DeviceState::default();
        assert_eq!(state.temperature, 0.0);
        assert_eq!(state.gas_level, 0);
        assert!(!state.led_on && !state.door_open && !state.tender_extended);
    }

    #[test]
    fn test_basic_snapshot_json_shape() {
        let snapshot = Snapshot {
            temperature: 20.0,
            humidity: 35.0,
            gas_level: 12,
            rain: None,
            water_level: Some(80),
            motion: false,
            led_on: true,
            door_open: None,
            tender_extended: None,
        };

        let json = serde_json::to_value(snapshot).unwrap();
        let object = json.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["gas", "hum", "led_state", "motion", "temp", "water"]);
        assert_eq!(json["water"], 80);
        assert_eq!(json["led_state"], true);
    }
}
