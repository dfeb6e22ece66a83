//! Cooperative poll loop.
//!
//! Every tick the loop polls the keypad once, feeds any key to the access
//! controller, advances the controller's timed state and, at the configured
//! interval, refreshes the sensors and writes the reading to the log.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use homestation_access::{AccessOutcome, KeypadAccessController};
use homestation_device::{SharedDeviceStore, Snapshot};
use homestation_hardware::{MatrixKeypad, TextDisplay};

/// Keypad wired to its access controller.
pub struct AccessPanel<K, D: TextDisplay> {
    keypad: K,
    controller: KeypadAccessController<D>,
}

impl<K: MatrixKeypad, D: TextDisplay> AccessPanel<K, D> {
    pub fn new(keypad: K, controller: KeypadAccessController<D>) -> Self {
        Self { keypad, controller }
    }

    /// Poll for at most one key, then advance the controller at `now`.
    pub fn step_at(&mut self, now: std::time::Instant) -> Option<AccessOutcome> {
        let outcome = self
            .keypad
            .poll_key()
            .and_then(|key| self.controller.handle_key_at(key, now));
        self.controller.tick_at(now);
        outcome
    }

    pub fn controller(&self) -> &KeypadAccessController<D> {
        &self.controller
    }
}

/// The station's main loop.
pub struct Station<K, D: TextDisplay> {
    store: SharedDeviceStore,
    panel: Option<AccessPanel<K, D>>,
    tick: Duration,

    /// Zero disables the periodic reading log.
    sensor_log_interval: Duration,

    ticks: u64,
}

impl<K: MatrixKeypad, D: TextDisplay> Station<K, D> {
    pub fn new(store: SharedDeviceStore, tick: Duration) -> Self {
        Self {
            store,
            panel: None,
            tick,
            sensor_log_interval: Duration::ZERO,
            ticks: 0,
        }
    }

    /// Attach a keypad access panel.
    pub fn with_panel(mut self, panel: AccessPanel<K, D>) -> Self {
        self.panel = Some(panel);
        self
    }

    /// Log a sensor reading every `interval`.
    pub fn with_sensor_log_interval(mut self, interval: Duration) -> Self {
        self.sensor_log_interval = interval;
        self
    }

    pub fn panel(&self) -> Option<&AccessPanel<K, D>> {
        self.panel.as_ref()
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run until `shutdown` becomes `true` or its sender is dropped, then
    /// hand the station back.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Self {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_log: Option<Instant> = None;

        info!(
            tick_ms = self.tick.as_millis() as u64,
            keypad = self.panel.is_some(),
            "Poll loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let now = Instant::now();
            if let Some(panel) = self.panel.as_mut() {
                if let Some(outcome) = panel.step_at(now.into_std()) {
                    info!(%outcome, "Keypad access attempt");
                }
            }

            let log_due = !self.sensor_log_interval.is_zero()
                && last_log.is_none_or(|at| now.duration_since(at) >= self.sensor_log_interval);
            if log_due {
                let snapshot = self.store.lock().await.refresh_sensors();
                info!("{}", format_reading(&snapshot));
                last_log = Some(now);
            }

            self.ticks += 1;
        }

        debug!(ticks = self.ticks, "Poll loop stopped");
        self
    }
}

/// One-line summary of a snapshot for the log.
///
/// ```
/// use homestation_device::Snapshot;
/// use homestation_firmware::format_reading;
///
/// let snapshot = Snapshot {
///     temperature: 22.46,
///     humidity: 41.0,
///     gas_level: 120,
///     rain: None,
///     water_level: Some(80),
///     motion: false,
///     led_on: true,
///     door_open: None,
///     tender_extended: None,
/// };
/// assert_eq!(
///     format_reading(&snapshot),
///     "T: 22.5 C, H: 41 %, Gas: 120 ppm, Water: 80 %, Motion: NO, LED: ON"
/// );
/// ```
pub fn format_reading(snapshot: &Snapshot) -> String {
    fn yes_no(value: bool) -> &'static str {
        if value { "YES" } else { "NO" }
    }
    fn on_off(value: bool) -> &'static str {
        if value { "ON" } else { "OFF" }
    }

    let mut line = format!(
        "T: {:.1} C, H: {:.0} %, Gas: {} ppm",
        snapshot.temperature, snapshot.humidity, snapshot.gas_level
    );
    if let Some(water) = snapshot.water_level {
        line.push_str(&format!(", Water: {water} %"));
    }
    if let Some(rain) = snapshot.rain {
        line.push_str(&format!(", Rain: {}", yes_no(rain)));
    }
    line.push_str(&format!(
        ", Motion: {}, LED: {}",
        yes_no(snapshot.motion),
        on_off(snapshot.led_on)
    ));
    if let Some(open) = snapshot.door_open {
        line.push_str(&format!(", Door: {}", if open { "OPEN" } else { "CLOSED" }));
    }
    if let Some(extended) = snapshot.tender_extended {
        line.push_str(&format!(
            ", Tender: {}",
            if extended { "EXTENDED" } else { "RETRACTED" }
        ));
    }
    line
}
