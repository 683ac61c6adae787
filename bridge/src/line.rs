//! # UART Line Reassembly
//!
//! The wired transport delivers telemetry as an unbounded byte stream with no
//! alignment to line boundaries: one read may carry half a line, three lines,
//! or a lone `\n`. [`LineReassembler`] accumulates those bytes and hands back
//! complete newline-terminated lines, holding any trailing fragment until the
//! rest of it arrives.
//!
//! The buffer is statically sized. A line that outgrows it is reported as an
//! explicit [`LineError::Overflow`] and the buffer is reset; nothing is ever
//! silently truncated.

use heapless::Vec;

/// Errors during line reassembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// A line exceeded the buffer capacity; the buffer has been reset
    Overflow,
}

/// Reassembles a byte stream into complete `\n`-terminated lines.
///
/// # Example
///
/// ```rust
/// use bridge::line::LineReassembler;
///
/// let mut reassembler = LineReassembler::<64>::new();
/// reassembler.feed(b"FORW").unwrap();
/// assert_eq!(reassembler.lines().count(), 0);
///
/// reassembler.feed(b"ARD\nSTO").unwrap();
/// let line = reassembler.lines().next().unwrap();
/// assert_eq!(&line[..], b"FORWARD");
/// assert_eq!(reassembler.residual(), b"STO");
/// ```
#[derive(Debug, Default)]
pub struct LineReassembler<const N: usize> {
    buf: Vec<u8, N>,
}

impl<const N: usize> LineReassembler<N> {
    /// Create an empty reassembler
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append raw bytes from the wired transport.
    ///
    /// On overflow the whole buffer (including the bytes that caused the
    /// overflow) is discarded and [`LineError::Overflow`] is returned;
    /// reassembly resumes cleanly at the next feed.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), LineError> {
        if self.buf.extend_from_slice(bytes).is_err() {
            self.buf.clear();
            return Err(LineError::Overflow);
        }
        Ok(())
    }

    /// Draining iterator over the complete lines buffered so far, oldest
    /// first. The newline delimiters are consumed; the trailing fragment
    /// (if any) stays in the buffer for the next feed.
    pub fn lines(&mut self) -> Lines<'_, N> {
        Lines { buf: &mut self.buf }
    }

    /// The not-yet-terminated tail of the stream
    pub fn residual(&self) -> &[u8] {
        &self.buf
    }

    /// Discard all buffered bytes
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// Iterator returned by [`LineReassembler::lines`]
pub struct Lines<'a, const N: usize> {
    buf: &'a mut Vec<u8, N>,
}

impl<'a, const N: usize> Iterator for Lines<'a, N> {
    type Item = Vec<u8, N>;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line = Vec::new();
        // pos < N, so the copy cannot fail
        let _ = line.extend_from_slice(&self.buf[..pos]);
        let rest = self.buf.len() - pos - 1;
        self.buf.copy_within(pos + 1.., 0);
        self.buf.truncate(rest);
        Some(line)
    }
}
