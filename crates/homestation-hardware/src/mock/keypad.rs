//! Mock keypad implementation for testing and development.
//!
//! This module provides a simulated matrix keypad that receives key presses
//! through an internal channel instead of a scanned key matrix.

use crate::traits::MatrixKeypad;
use crate::{HardwareError, Result};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Queue depth for pending key presses.
const KEY_QUEUE_CAPACITY: usize = 32;

/// Mock keypad device for testing and development.
///
/// Key presses sent through the paired [`MockKeypadHandle`] queue up and are
/// returned one per [`poll_key`](MatrixKeypad::poll_key) call.
///
/// # Examples
///
/// ```
/// use homestation_hardware::mock::MockKeypad;
/// use homestation_hardware::MatrixKeypad;
///
/// let (mut keypad, handle) = MockKeypad::new();
///
/// assert_eq!(keypad.poll_key(), None);
///
/// handle.try_press('1').unwrap();
/// handle.try_press('A').unwrap();
///
/// assert_eq!(keypad.poll_key(), Some('1'));
/// assert_eq!(keypad.poll_key(), Some('A'));
/// assert_eq!(keypad.poll_key(), None);
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    /// Channel receiver for simulated key presses
    key_rx: mpsc::Receiver<char>,
}

impl MockKeypad {
    /// Create a new mock keypad.
    ///
    /// Returns a tuple of (MockKeypad, MockKeypadHandle) where the handle
    /// can be used to press keys on the keypad.
    pub fn new() -> (Self, MockKeypadHandle) {
        let (key_tx, key_rx) = mpsc::channel(KEY_QUEUE_CAPACITY);
        (Self { key_rx }, MockKeypadHandle { key_tx })
    }
}

impl MatrixKeypad for MockKeypad {
    fn poll_key(&mut self) -> Option<char> {
        match self.key_rx.try_recv() {
            Ok(key) => Some(key),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Handle for pressing keys on a mock keypad.
///
/// The handle can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    /// Channel sender for simulated key presses
    key_tx: mpsc::Sender<char>,
}

impl MockKeypadHandle {
    /// Press a key, waiting for queue space if the keypad is behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped.
    pub async fn press(&self, key: char) -> Result<()> {
        self.key_tx
            .send(key)
            .await
            .map_err(|_| HardwareError::disconnected("Keypad key channel closed"))
    }

    /// Press every character of `keys` in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use homestation_hardware::mock::MockKeypad;
    ///
    /// #[tokio::main]
    /// async fn main() -> homestation_hardware::Result<()> {
    ///     let (_keypad, handle) = MockKeypad::new();
    ///     handle.press_sequence("1234A").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn press_sequence(&self, keys: &str) -> Result<()> {
        for key in keys.chars() {
            self.press(key).await?;
        }
        Ok(())
    }

    /// Press a key without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue is full or the keypad has been dropped.
    pub fn try_press(&self, key: char) -> Result<()> {
        self.key_tx.try_send(key).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                HardwareError::communication("Keypad key queue full")
            }
            mpsc::error::TrySendError::Closed(_) => {
                HardwareError::disconnected("Keypad key channel closed")
            }
        })
    }
}
