//! Property-based tests for sensor scaling and value retention.

use homestation_device::{DeviceStore, gas_level, map_range, water_level};
use homestation_hardware::mock::*;
use proptest::prelude::*;

/// Strategy for raw 12-bit conversions.
fn raw_adc() -> impl Strategy<Value = u16> {
    0u16..=4095u16
}

/// Strategy for plausible climate readings.
fn climate() -> impl Strategy<Value = (f32, f32)> {
    (-40.0f32..80.0f32, 0.0f32..100.0f32)
}

/// Strategy for a climate reading the sensor reports as a failed conversion.
fn invalid_climate() -> impl Strategy<Value = (f32, f32)> {
    prop_oneof![
        Just((f32::NAN, f32::NAN)),
        (-40.0f32..80.0f32).prop_map(|t| (t, f32::NAN)),
        (0.0f32..100.0f32).prop_map(|h| (f32::NAN, h)),
    ]
}

proptest! {
    /// Property: gas level stays in range and never decreases as the raw
    /// conversion rises.
    #[test]
    fn prop_gas_level_monotonic(a in raw_adc(), b in raw_adc()) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        prop_assert!((0..=1000).contains(&gas_level(low)));
        prop_assert!((0..=1000).contains(&gas_level(high)));
        prop_assert!(gas_level(low) <= gas_level(high));
    }

    /// Property: water level is the gas mapping reflected onto 0..=100.
    #[test]
    fn prop_water_level_inverted(a in raw_adc(), b in raw_adc()) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        prop_assert!((0..=100).contains(&water_level(low)));
        prop_assert!(water_level(low) >= water_level(high));
    }

    /// Property: mapping a range endpoint always lands on the target endpoint.
    #[test]
    fn prop_map_range_endpoints(
        in_min in -10_000i64..10_000,
        span in 1i64..10_000,
        out_min in -10_000i64..10_000,
        out_max in -10_000i64..10_000,
    ) {
        let in_max = in_min + span;
        prop_assert_eq!(map_range(in_min, in_min, in_max, out_min, out_max), out_min);
        prop_assert_eq!(map_range(in_max, in_min, in_max, out_min, out_max), out_max);
    }

    /// Property: a failed climate conversion after a valid one leaves the
    /// snapshot holding the valid reading.
    #[test]
    fn prop_invalid_climate_retains_previous(
        (temperature, humidity) in climate(),
        (bad_t, bad_h) in invalid_climate(),
    ) {
        let (climate, handle) = MockClimateSensor::new();
        let (gas, _) = MockAnalogInput::new();
        let (motion, _) = MockDigitalInput::new();
        let (led, _) = MockOutputPin::new();

        let mut store = DeviceStore::builder()
            .with_climate(climate)
            .with_gas(gas)
            .with_motion(motion)
            .with_led(led)
            .build()
            .unwrap();

        handle.set(temperature, humidity);
        store.refresh_sensors();

        handle.set(bad_t, bad_h);
        let snapshot = store.refresh_sensors();

        prop_assert_eq!(snapshot.temperature, temperature);
        prop_assert_eq!(snapshot.humidity, humidity);
    }
}
