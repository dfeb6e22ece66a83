//! Key classification.

use homestation_core::constants::{DEFAULT_CLEAR_KEY, DEFAULT_SUBMIT_KEY};

/// What a key press means to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Append the character to the entered code.
    Entry(char),

    /// Discard the entered code.
    Clear,

    /// Compare the entered code with the credential.
    Submit,
}

/// Assignment of the two reserved keys.
///
/// Every other key is an entry key.
///
/// # Examples
///
/// ```
/// use homestation_access::{KeyAction, KeyMap};
///
/// let keymap = KeyMap::default();
/// assert_eq!(keymap.classify('A'), KeyAction::Submit);
/// assert_eq!(keymap.classify('D'), KeyAction::Clear);
/// assert_eq!(keymap.classify('#'), KeyAction::Entry('#'));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMap {
    submit: char,
    clear: char,
}

impl KeyMap {
    /// Create a key map with the given submit and clear keys.
    pub fn new(submit: char, clear: char) -> Self {
        Self { submit, clear }
    }

    /// Classify a pressed key.
    pub fn classify(&self, key: char) -> KeyAction {
        if key == self.submit {
            KeyAction::Submit
        } else if key == self.clear {
            KeyAction::Clear
        } else {
            KeyAction::Entry(key)
        }
    }

    pub fn submit_key(&self) -> char {
        self.submit
    }

    pub fn clear_key(&self) -> char {
        self.clear
    }

    /// The key is one of the two control keys.
    pub fn is_reserved(&self, key: char) -> bool {
        key == self.submit || key == self.clear
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new(DEFAULT_SUBMIT_KEY, DEFAULT_CLEAR_KEY)
    }
}
