//! Keypad access controller state machine.
//!
//! # States
//!
//! - `Idle`: nothing entered, the display shows the entry prompt
//! - `Accumulating`: at least one entry key since the last clear or submit
//! - `Presenting`: the outcome of the last submit is on the display until a
//!   deadline passes
//!
//! # Transitions
//!
//! - Idle/Accumulating → Accumulating on an entry key
//! - Idle/Accumulating → Idle on the clear key
//! - Idle/Accumulating → Presenting on the submit key
//! - Presenting → Idle from [`tick`](KeypadAccessController::tick) once the
//!   deadline has passed
//!
//! Keys that arrive while presenting are dropped.
//!
//! # Examples
//!
//! ```
//! use std::time::{Duration, Instant};
//! use homestation_access::{AccessOutcome, AccessState, KeypadAccessController};
//! use homestation_hardware::VirtualLcd;
//!
//! let mut controller = KeypadAccessController::new("1234", VirtualLcd::default());
//! let start = Instant::now();
//!
//! for key in "1234".chars() {
//!     assert_eq!(controller.handle_key_at(key, start), None);
//! }
//! assert_eq!(
//!     controller.handle_key_at('A', start),
//!     Some(AccessOutcome::Granted)
//! );
//! assert_eq!(controller.buffer(), "");
//! assert_eq!(controller.display().render(), "ACCESS GRANTED|");
//!
//! controller.tick_at(start + Duration::from_secs(2));
//! assert_eq!(controller.state(), AccessState::Idle);
//! assert_eq!(controller.display().render(), "ENTER CODE:|");
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use homestation_core::AccessConfig;
use homestation_core::constants::{
    DEFAULT_PRESENTATION_MS, MSG_ACCESS_DENIED, MSG_ACCESS_GRANTED, MSG_ENTER_CODE,
};
use homestation_hardware::{HardwareError, TextDisplay};

use crate::keymap::{KeyAction, KeyMap};

/// Maximum number of evaluated attempts kept in history.
const MAX_HISTORY_SIZE: usize = 32;

/// Result of evaluating an entered code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    Granted,
    Denied,
}

impl AccessOutcome {
    /// Fixed display message for this outcome.
    pub fn message(&self) -> &'static str {
        match self {
            AccessOutcome::Granted => MSG_ACCESS_GRANTED,
            AccessOutcome::Denied => MSG_ACCESS_DENIED,
        }
    }
}

impl fmt::Display for AccessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessOutcome::Granted => write!(f, "granted"),
            AccessOutcome::Denied => write!(f, "denied"),
        }
    }
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    /// Buffer empty, prompt displayed.
    Idle,

    /// Buffer non-empty.
    Accumulating,

    /// Outcome displayed until `until`.
    Presenting {
        outcome: AccessOutcome,
        until: Instant,
    },
}

impl fmt::Display for AccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessState::Idle => write!(f, "Idle"),
            AccessState::Accumulating => write!(f, "Accumulating"),
            AccessState::Presenting { outcome, .. } => write!(f, "Presenting({outcome})"),
        }
    }
}

/// Running counters of evaluated attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccessStats {
    pub granted: u64,
    pub denied: u64,
}

impl AccessStats {
    /// Total submits evaluated.
    pub fn attempts(&self) -> u64 {
        self.granted + self.denied
    }

    fn record(&mut self, outcome: AccessOutcome) {
        match outcome {
            AccessOutcome::Granted => self.granted += 1,
            AccessOutcome::Denied => self.denied += 1,
        }
    }
}

/// One evaluated submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessAttempt {
    pub outcome: AccessOutcome,

    /// When the submit key was handled.
    pub at: Instant,
}

/// Keypad access controller driving a text display.
///
/// The controller owns its display. It never touches device state.
///
/// # Thread Safety
///
/// This struct is not synchronised. The poll loop owns it outright.
pub struct KeypadAccessController<D: TextDisplay> {
    credential: String,
    keymap: KeyMap,
    presentation: Duration,

    /// Entered code since the last clear or submit.
    entered: String,

    state: AccessState,
    last_result: Option<AccessOutcome>,
    stats: AccessStats,

    /// Recent attempts, oldest first.
    history: VecDeque<AccessAttempt>,

    display: D,
}

impl<D: TextDisplay> KeypadAccessController<D> {
    /// Create a controller with the default key map and presentation time,
    /// and show the entry prompt.
    pub fn new(credential: impl Into<String>, display: D) -> Self {
        let mut controller = Self {
            credential: credential.into(),
            keymap: KeyMap::default(),
            presentation: Duration::from_millis(DEFAULT_PRESENTATION_MS),
            entered: String::new(),
            state: AccessState::Idle,
            last_result: None,
            stats: AccessStats::default(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            display,
        };
        controller.render_prompt();
        controller
    }

    /// Create a controller from the `access` configuration section.
    pub fn from_config(config: &AccessConfig, display: D) -> Self {
        Self::new(config.credential.clone(), display)
            .with_keymap(KeyMap::new(config.submit_key, config.clear_key))
            .with_presentation(config.presentation())
    }

    /// Replace the key map.
    pub fn with_keymap(mut self, keymap: KeyMap) -> Self {
        self.keymap = keymap;
        self
    }

    /// Replace how long an outcome stays on the display.
    pub fn with_presentation(mut self, presentation: Duration) -> Self {
        self.presentation = presentation;
        self
    }

    /// Handle one key press at the current time.
    ///
    /// Returns the outcome when the key was the submit key.
    pub fn handle_key(&mut self, key: char) -> Option<AccessOutcome> {
        self.handle_key_at(key, Instant::now())
    }

    /// Handle one key press at `now`.
    pub fn handle_key_at(&mut self, key: char, now: Instant) -> Option<AccessOutcome> {
        if let AccessState::Presenting { outcome, .. } = self.state {
            debug!(%outcome, "Key dropped while presenting");
            return None;
        }

        match self.keymap.classify(key) {
            KeyAction::Entry(c) => {
                self.entered.push(c);
                self.state = AccessState::Accumulating;
                self.render_entry();
                None
            }
            KeyAction::Clear => {
                self.entered.clear();
                self.state = AccessState::Idle;
                self.render_prompt();
                debug!("Entry cleared");
                None
            }
            KeyAction::Submit => Some(self.evaluate(now)),
        }
    }

    /// Advance timed state at the current time.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Advance timed state at `now`.
    ///
    /// Returns `true` if a presentation ended and the controller went back
    /// to `Idle`.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        match self.state {
            AccessState::Presenting { until, .. } if now >= until => {
                self.state = AccessState::Idle;
                self.last_result = None;
                self.render_prompt();
                true
            }
            _ => false,
        }
    }

    fn evaluate(&mut self, now: Instant) -> AccessOutcome {
        let matches: bool = self
            .entered
            .as_bytes()
            .ct_eq(self.credential.as_bytes())
            .into();

        let outcome = if matches && !self.entered.is_empty() {
            AccessOutcome::Granted
        } else {
            AccessOutcome::Denied
        };

        info!(%outcome, length = self.entered.chars().count(), "Access code evaluated");

        self.entered.clear();
        self.last_result = Some(outcome);
        self.state = AccessState::Presenting {
            outcome,
            until: now + self.presentation,
        };
        self.stats.record(outcome);
        if self.history.len() >= MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(AccessAttempt { outcome, at: now });

        self.render_outcome(outcome);
        outcome
    }

    /// Code entered since the last clear or submit.
    pub fn buffer(&self) -> &str {
        &self.entered
    }

    pub fn state(&self) -> AccessState {
        self.state
    }

    /// Outcome currently being presented, if any.
    pub fn last_result(&self) -> Option<AccessOutcome> {
        self.last_result
    }

    pub fn is_presenting(&self) -> bool {
        matches!(self.state, AccessState::Presenting { .. })
    }

    pub fn stats(&self) -> &AccessStats {
        &self.stats
    }

    /// Recent attempts, oldest first.
    pub fn history(&self) -> &VecDeque<AccessAttempt> {
        &self.history
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    fn render_prompt(&mut self) {
        let result = self
            .display
            .clear()
            .and_then(|()| self.display.write_at(0, 0, MSG_ENTER_CODE));
        report_display(result);
    }

    fn render_entry(&mut self) {
        let tail = visible_tail(&self.entered, usize::from(self.display.columns()));
        let result = self
            .display
            .clear()
            .and_then(|()| self.display.write_at(0, 0, MSG_ENTER_CODE))
            .and_then(|()| self.display.write_at(1, 0, tail));
        report_display(result);
    }

    fn render_outcome(&mut self, outcome: AccessOutcome) {
        let result = self
            .display
            .clear()
            .and_then(|()| self.display.write_at(0, 0, outcome.message()));
        report_display(result);
    }
}

fn report_display(result: Result<(), HardwareError>) {
    if let Err(e) = result {
        warn!(error = %e, "Display write failed");
    }
}

/// Last `width` characters of `text`.
fn visible_tail(text: &str, width: usize) -> &str {
    let skip = text.chars().count().saturating_sub(width);
    match text.char_indices().nth(skip) {
        Some((index, _)) => &text[index..],
        None => "",
    }
}
