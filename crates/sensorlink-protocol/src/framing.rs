//! Reassembly of wire lines from transport chunks.
//!
//! A fixed-size read can end anywhere, including inside a payload, and one
//! read can carry several lines. [`LineAssembler`] keeps the unfinished tail
//! of each chunk and prepends it to the next one.
//!
//! Some controllers never terminate their lines. A tail without a terminator
//! is therefore released early when it ends with `|` and decodes on its own,
//! and [`LineAssembler::flush`] releases whatever is held once the link goes
//! quiet.
//!
//! ```
//! use sensorlink_protocol::LineAssembler;
//!
//! let mut lines = LineAssembler::new();
//! assert!(lines.push("Gas:number(3").unwrap().is_empty());
//! assert_eq!(lines.push("10)|\nIUD:str(04").unwrap(), vec!["Gas:number(310)"]);
//! assert_eq!(lines.pending(), "IUD:str(04");
//! ```

use crate::codec::{decode_message, split_lines, strip_framing};
use sensorlink_core::constants::{DELIMITER_FIELD, LINE_TERMINATOR, MAX_LINE_LENGTH};
use sensorlink_core::{Error, Result};

/// Turns a stream of chunks into complete, framed lines.
#[derive(Debug)]
pub struct LineAssembler {
    pending: String,
    limit: usize,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::with_limit(MAX_LINE_LENGTH)
    }
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembler that gives up on a line once `limit` bytes are held.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: String::new(),
            limit,
        }
    }

    /// Append `chunk` and return every line it completes, in arrival order.
    ///
    /// Returned lines have their framing stripped and are never empty.
    ///
    /// # Errors
    /// Returns `Error::LineTooLong` when the unfinished line outgrows the
    /// limit. The held text is discarded.
    pub fn push(&mut self, chunk: &str) -> Result<Vec<String>> {
        self.pending.push_str(chunk);

        let split = self
            .pending
            .rfind(LINE_TERMINATOR as char)
            .map_or(0, |i| i + 1);
        let mut lines: Vec<String> = split_lines(&self.pending[..split])
            .map(str::to_string)
            .collect();
        self.pending.drain(..split);

        if self.tail_is_complete() {
            lines.extend(self.flush());
        } else if self.pending.len() > self.limit {
            self.pending.clear();
            return Err(Error::LineTooLong { limit: self.limit });
        }

        Ok(lines)
    }

    /// Release the held text as a line, if there is any.
    pub fn flush(&mut self) -> Option<String> {
        let line = strip_framing(&self.pending).to_string();
        self.pending.clear();
        (!line.is_empty()).then_some(line)
    }

    /// Text held back waiting for the rest of its line.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    fn tail_is_complete(&self) -> bool {
        self.pending.trim_end().ends_with(DELIMITER_FIELD) && decode_message(&self.pending).is_ok()
    }
}
