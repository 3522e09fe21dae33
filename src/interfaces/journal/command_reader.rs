use super::command::Command;
use crate::error::{ReconcileError, Result};
use std::io::BufRead;

/// Reads commands from a JSON-lines journal.
///
/// Blank lines and lines starting with `#` are skipped. Every other line
/// yields its 1-based line number with the parsed command or the error that
/// prevented parsing, so one bad line does not stop the stream.
pub struct CommandReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> CommandReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn commands(self) -> impl Iterator<Item = (usize, Result<Command>)> {
        self.source
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let line_no = index + 1;
                let line = match line {
                    Ok(line) => line,
                    Err(e) => return Some((line_no, Err(ReconcileError::from(e)))),
                };
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    return None;
                }
                Some((line_no, serde_json::from_str(trimmed).map_err(ReconcileError::from)))
            })
    }
}
