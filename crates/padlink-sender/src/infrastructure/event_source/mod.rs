//! Line-oriented event source.
//!
//! The headless sender reads UI events as one JSON object per line, in the
//! same shape the wire codec produces:
//!
//! ```text
//! {"type":"pointer_move","dx":4,"dy":-1}
//! {"type":"button","code":10,"down":true}
//! ```
//!
//! Blank lines are skipped; malformed lines are logged and skipped so one
//! typo does not end the session.

use padlink_core::Event;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

/// Yields [`Event`]s parsed from any async line reader.
pub struct LineEventSource<R> {
    lines: Lines<R>,
    line_no: u64,
}

/// Event source bound to the process's standard input.
pub type StdinEventSource = LineEventSource<BufReader<Stdin>>;

impl StdinEventSource {
    /// Reads events from stdin.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> LineEventSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    /// Returns the next well-formed event, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying reader.
    pub async fn next_event(&mut self) -> std::io::Result<Option<Event>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(trimmed) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => warn!(line = self.line_no, "skipping malformed event: {e}"),
            }
        }
        Ok(None)
    }
}
