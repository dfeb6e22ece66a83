//! Line console that types keys on the simulated keypad.

use std::io::BufRead;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use homestation_hardware::mock::MockKeypadHandle;

/// Lines buffered between the reader thread and the keypad task.
const LINE_QUEUE: usize = 8;

/// Keys present on the 4x4 matrix keypad.
pub fn is_keypad_key(key: char) -> bool {
    matches!(key, '0'..='9' | 'A'..='D' | '*' | '#')
}

/// Read lines from a blocking `reader` on a detached thread and press their
/// keys from a tokio task.
///
/// Whitespace is skipped and lowercase `a`-`d` are accepted. Other
/// characters are logged and dropped. The task ends at end of input or when
/// the keypad has been dropped.
///
/// Use this for stdin: the thread is not owned by the runtime, so a read
/// that never returns does not keep the runtime from shutting down. Aborting
/// the returned task stops key presses; the thread exits at its next line.
/// The task yields the number of keys pressed.
///
/// # Errors
///
/// Returns an error if the reader thread cannot be started.
pub fn spawn_line_reader<R>(reader: R, keypad: MockKeypadHandle) -> anyhow::Result<JoinHandle<usize>>
where
    R: BufRead + Send + 'static,
{
    let (line_tx, mut line_rx) = mpsc::channel::<String>(LINE_QUEUE);

    std::thread::Builder::new()
        .name("keypad-console".into())
        .spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else {
                    break;
                };
                if line_tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })
        .context("starting console thread")?;

    Ok(tokio::spawn(async move {
        let mut pressed = 0;
        while let Some(line) = line_rx.recv().await {
            match press_line(&line, &keypad).await {
                Ok(count) => pressed += count,
                Err(e) => {
                    warn!(error = %e, "Keypad console stopped");
                    break;
                }
            }
        }
        debug!(pressed, "Console input closed");
        pressed
    }))
}

async fn press_line(line: &str, keypad: &MockKeypadHandle) -> anyhow::Result<usize> {
    let mut pressed = 0;
    for key in line.chars().filter(|c| !c.is_whitespace()) {
        let key = key.to_ascii_uppercase();
        if !is_keypad_key(key) {
            warn!(key = %key, "Not a keypad key, ignoring");
            continue;
        }
        keypad.press(key).await.context("pressing keypad key")?;
        pressed += 1;
    }
    Ok(pressed)
}
