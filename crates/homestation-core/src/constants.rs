//! Station-wide constants.
//!
//! Converter ranges, display text and timing defaults for the station
//! board.
//!
//! ```
//! use homestation_core::constants::*;
//!
//! assert_eq!(ADC_MAX, 4095);
//! assert_eq!(SERVO_OPEN_ANGLE, 90);
//! ```

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

// ============================================================================
// Converter Ranges
// ============================================================================

/// Lowest raw value of the 12-bit analog converter.
pub const ADC_MIN: i64 = 0;

/// Highest raw value of the 12-bit analog converter.
pub const ADC_MAX: i64 = 4095;

/// Upper bound of the scaled gas level.
pub const GAS_LEVEL_MAX: i64 = 1000;

/// Upper bound of the scaled water level (percent).
pub const WATER_LEVEL_MAX: i64 = 100;

// ============================================================================
// Servo Positions
// ============================================================================

/// Servo angle for a closed door or a retracted tender.
pub const SERVO_REST_ANGLE: u8 = 0;

/// Servo angle for an open door or an extended tender.
pub const SERVO_OPEN_ANGLE: u8 = 90;

// ============================================================================
// Display
// ============================================================================

/// Rows on the character LCD.
pub const LCD_ROWS: u8 = 2;

/// Columns on the character LCD.
pub const LCD_COLUMNS: u8 = 16;

/// First LCD line while waiting for a code.
pub const MSG_ENTER_CODE: &str = "ENTER CODE:";

/// LCD message after a matching code.
pub const MSG_ACCESS_GRANTED: &str = "ACCESS GRANTED";

/// LCD message after a code that does not match.
pub const MSG_ACCESS_DENIED: &str = "ACCESS DENIED";

// ============================================================================
// Keypad
// ============================================================================

/// Key that submits the entered code for evaluation.
pub const DEFAULT_SUBMIT_KEY: char = 'A';

/// Key that discards the entered code.
pub const DEFAULT_CLEAR_KEY: char = 'D';

/// Code accepted when no credential is configured.
pub const DEFAULT_CREDENTIAL: &str = "1234";

// ============================================================================
// Timing (milliseconds)
// ============================================================================

/// How long the granted/denied message stays on the LCD.
pub const DEFAULT_PRESENTATION_MS: u64 = 2000;

/// Poll loop tick.
pub const DEFAULT_TICK_MS: u64 = 50;

/// Interval between sensor log lines.
pub const DEFAULT_SENSOR_LOG_INTERVAL_MS: u64 = 5000;

// ============================================================================
// Network
// ============================================================================

/// mDNS hostname announced by the board.
pub const DEFAULT_HOSTNAME: &str = "esp32-sensor";

/// HTTP listen address.
pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 80));

/// Simultaneous HTTP connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;

/// How long an idle keep-alive connection is held open.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 5000;
