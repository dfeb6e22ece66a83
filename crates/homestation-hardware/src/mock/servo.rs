//! Mock hobby servo.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::traits::PositionActuator;
use crate::{HardwareError, Result};

/// Travel of a standard hobby servo.
const MAX_ANGLE: u8 = 180;

/// Stored angle before the first command.
const NO_ANGLE: u16 = u16::MAX;

/// Mock servo recording the last commanded angle.
///
/// # Examples
///
/// ```
/// use homestation_hardware::mock::MockServo;
/// use homestation_hardware::PositionActuator;
///
/// let (mut servo, handle) = MockServo::new();
/// assert_eq!(handle.angle(), None);
///
/// servo.write_angle(90).unwrap();
/// assert_eq!(handle.angle(), Some(90));
/// ```
#[derive(Debug)]
pub struct MockServo {
    angle: Arc<AtomicU16>,
    faulted: Arc<AtomicBool>,
}

impl MockServo {
    /// Create a servo that has not been commanded yet.
    pub fn new() -> (Self, MockServoHandle) {
        let angle = Arc::new(AtomicU16::new(NO_ANGLE));
        let faulted = Arc::new(AtomicBool::new(false));
        (
            Self {
                angle: Arc::clone(&angle),
                faulted: Arc::clone(&faulted),
            },
            MockServoHandle { angle, faulted },
        )
    }
}

impl PositionActuator for MockServo {
    fn write_angle(&mut self, degrees: u8) -> Result<()> {
        if degrees > MAX_ANGLE {
            return Err(HardwareError::AngleOutOfRange {
                degrees,
                max: MAX_ANGLE,
            });
        }
        if self.faulted.load(Ordering::Acquire) {
            return Err(HardwareError::communication("Servo PWM channel faulted"));
        }

        self.angle.store(u16::from(degrees), Ordering::Release);
        Ok(())
    }
}

/// Handle for observing a mock servo.
#[derive(Debug, Clone)]
pub struct MockServoHandle {
    angle: Arc<AtomicU16>,
    faulted: Arc<AtomicBool>,
}

impl MockServoHandle {
    /// Last commanded angle, `None` before the first command.
    pub fn angle(&self) -> Option<u8> {
        u8::try_from(self.angle.load(Ordering::Acquire)).ok()
    }

    /// Make commands fail (`true`) or succeed again (`false`).
    pub fn set_faulted(&self, faulted: bool) {
        self.faulted.store(faulted, Ordering::Release);
    }
}
