//! Pull-based logical line reader over a byte stream.

use std::io::BufRead;

use super::error::ParseError;
use super::lexer::find_value_separator;
use crate::error::RfcResult;

/// One unfolded line together with the number of its first physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub text: String,
    pub line: usize,
}

/// Reads unfolded logical lines from a stream.
///
/// Accepts CRLF, LF and CR line endings. A physical line starting with a space
/// or tab continues the previous one. A quoted-printable line ending in `=`
/// continues onto the next physical line even without leading whitespace.
pub struct LineReader<R> {
    inner: R,
    line: usize,
    peeked: Option<LogicalLine>,
    physical: Option<LogicalLine>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            peeked: None,
            physical: None,
        }
    }

    /// Returns the next non-empty logical line.
    ///
    /// ## Errors
    /// Returns an error on I/O failure or invalid UTF-8.
    pub fn next_line(&mut self) -> RfcResult<Option<LogicalLine>> {
        if let Some(line) = self.peeked.take() {
            return Ok(Some(line));
        }

        let mut current = loop {
            match self.next_physical()? {
                None => return Ok(None),
                Some(line) if line.text.trim().is_empty() => {}
                Some(line) => break line,
            }
        };

        loop {
            if is_soft_break(&current.text) {
                match self.next_physical()? {
                    Some(next) => {
                        current.text.pop();
                        current.text.push_str(&next.text);
                        continue;
                    }
                    None => break,
                }
            }

            match self.next_physical()? {
                Some(next) if next.text.starts_with([' ', '\t']) => {
                    current.text.push_str(&next.text[1..]);
                }
                Some(next) => {
                    self.physical = Some(next);
                    break;
                }
                None => break,
            }
        }

        tracing::trace!(line = current.line, "read logical line");
        Ok(Some(current))
    }

    /// Pushes a logical line back so the next call returns it again.
    pub fn unread(&mut self, line: LogicalLine) {
        self.peeked = Some(line);
    }

    /// Number of physical lines consumed so far.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn next_physical(&mut self) -> RfcResult<Option<LogicalLine>> {
        if let Some(line) = self.physical.take() {
            return Ok(Some(line));
        }

        let mut bytes = Vec::new();
        let mut terminated = false;

        loop {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                break;
            }

            if let Some(pos) = available.iter().position(|&b| b == b'\r' || b == b'\n') {
                let terminator = available[pos];
                bytes.extend_from_slice(&available[..pos]);
                self.inner.consume(pos + 1);
                if terminator == b'\r' && self.inner.fill_buf()?.first() == Some(&b'\n') {
                    self.inner.consume(1);
                }
                terminated = true;
                break;
            }

            let len = available.len();
            bytes.extend_from_slice(available);
            self.inner.consume(len);
        }

        if bytes.is_empty() && !terminated {
            return Ok(None);
        }

        self.line += 1;
        let line = self.line;
        let text =
            String::from_utf8(bytes).map_err(|err| ParseError::invalid_utf8(line, &err))?;
        Ok(Some(LogicalLine { text, line }))
    }
}

/// A quoted-printable property whose value ends with `=` continues on the
/// next line.
fn is_soft_break(text: &str) -> bool {
    if !text.ends_with('=') {
        return false;
    }
    find_value_separator(text).is_some_and(|pos| {
        text[..pos]
            .to_ascii_uppercase()
            .contains("QUOTED-PRINTABLE")
    })
}
