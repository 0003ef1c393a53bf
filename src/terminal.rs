use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::ascii_frame::CharFrame;
use crate::geometry::TerminalSize;
use crate::playback::TerminalIo;

pub const FALLBACK_COLUMNS: u16 = 80;
pub const FALLBACK_ROWS: u16 = 24;

/// Stdout-backed terminal. Frames are written as plain newline-terminated
/// rows, so each print scrolls the previous frame away.
pub struct CrosstermTerminal<W: Write> {
    out: W,
}

impl CrosstermTerminal<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> CrosstermTerminal<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TerminalIo for CrosstermTerminal<W> {
    fn size(&mut self) -> Result<TerminalSize> {
        match crossterm::terminal::size() {
            Ok((columns, rows)) => Ok(TerminalSize::new(rows, columns)),
            Err(error) => {
                log::debug!(
                    "terminal size unavailable ({error}), using {FALLBACK_COLUMNS}x{FALLBACK_ROWS}"
                );
                Ok(TerminalSize::new(FALLBACK_ROWS, FALLBACK_COLUMNS))
            }
        }
    }

    fn print_frame(&mut self, frame: &CharFrame) -> Result<()> {
        self.out
            .write_all(frame.to_text().as_bytes())
            .context("failed to write frame")?;
        self.out.flush().context("failed to flush frame")
    }
}
