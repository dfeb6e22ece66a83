//! Virtual character LCD.
//!
//! This module provides an in-memory stand-in for the station's 16x2 HD44780
//! style LCD. It keeps one padded string per row exactly as the glass would
//! show it, so tests can assert on what a user would read.
//!
//! # Character Encoding - ASCII Only
//!
//! The LCD character ROM only covers printable ASCII (0x20-0x7E). Control
//! characters are dropped and anything outside ASCII is shown as `?`, the
//! way the ROM's fallback glyph would look.
//!
//! # Examples
//!
//! ```
//! use homestation_hardware::{TextDisplay, VirtualLcd};
//!
//! let mut lcd = VirtualLcd::new(2, 16);
//! lcd.write_at(1, 0, "1234").unwrap();
//! lcd.write_at(1, 2, "99").unwrap();
//!
//! assert_eq!(lcd.line(1).unwrap(), "1299            ");
//! ```

use tracing::trace;

use crate::error::{HardwareError, Result};
use crate::traits::TextDisplay;

/// In-memory character display.
///
/// # Thread Safety
///
/// This struct is not synchronised. When it is shared between tasks, wrap
/// it in `tokio::sync::Mutex` or move it into a single owning task.
#[derive(Debug, Clone)]
pub struct VirtualLcd {
    /// Number of rows.
    rows: u8,

    /// Number of columns per row.
    columns: u8,

    /// One padded string per row.
    buffer: Vec<String>,

    /// Number of `clear`/`write_at` calls made so far.
    writes: usize,
}

impl VirtualLcd {
    /// Create a blank display of `rows` x `columns`.
    ///
    /// # Examples
    ///
    /// ```
    /// use homestation_hardware::VirtualLcd;
    ///
    /// let lcd = VirtualLcd::new(2, 16);
    /// assert_eq!(lcd.line(0).unwrap().len(), 16);
    /// ```
    pub fn new(rows: u8, columns: u8) -> Self {
        Self {
            rows,
            columns,
            buffer: vec![" ".repeat(columns as usize); rows as usize],
            writes: 0,
        }
    }

    /// Text of one row, padded to the column width.
    ///
    /// # Errors
    ///
    /// Returns an error if `row` is not on the display.
    pub fn line(&self, row: u8) -> Result<&str> {
        self.buffer
            .get(row as usize)
            .map(String::as_str)
            .ok_or(HardwareError::InvalidPosition { row, column: 0 })
    }

    /// All rows, top to bottom.
    pub fn lines(&self) -> &[String] {
        &self.buffer
    }

    /// Rows joined with `|`, trailing spaces trimmed, for log lines.
    pub fn render(&self) -> String {
        self.buffer
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Every row is blank.
    pub fn is_blank(&self) -> bool {
        self.buffer.iter().all(|line| line.trim().is_empty())
    }

    /// Number of `clear`/`write_at` calls received.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Default for VirtualLcd {
    fn default() -> Self {
        Self::new(2, 16)
    }
}

impl TextDisplay for VirtualLcd {
    fn rows(&self) -> u8 {
        self.rows
    }

    fn columns(&self) -> u8 {
        self.columns
    }

    fn clear(&mut self) -> Result<()> {
        for line in &mut self.buffer {
            *line = " ".repeat(self.columns as usize);
        }
        self.writes += 1;
        trace!("LCD cleared");
        Ok(())
    }

    fn write_at(&mut self, row: u8, column: u8, text: &str) -> Result<()> {
        if row >= self.rows || column >= self.columns {
            return Err(HardwareError::InvalidPosition { row, column });
        }

        let line = &mut self.buffer[row as usize];
        let start = column as usize;
        let room = self.columns as usize - start;
        let glyphs: String = sanitize_text(text).chars().take(room).collect();

        line.replace_range(start..start + glyphs.len(), &glyphs);
        self.writes += 1;
        trace!(row, column, text = %glyphs, "LCD write");
        Ok(())
    }
}

/// Map text onto the LCD character set.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}
