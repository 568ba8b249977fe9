//! Scrollback log: variable-length lines in fixed-size storage.
//!
//! Two ring buffers back the log. `log` is a raw byte stream written only
//! with [`RingBuffer::force_put`]; its read cursor is never advanced.
//! `index` holds one [`LineRecord`] per added line, also appended with
//! `force_put`, so both buffers silently overwrite their oldest content.
//!
//! Because lines vary in length, the byte log can wrap over bytes that an
//! older record still points at before that record leaves the index. Each
//! record therefore remembers the absolute stream position it was written
//! at, and [`ScrollbackLog::check_clean`] drops records whose bytes have
//! been overwritten. It runs after every [`ScrollbackLog::add_line`], so
//! [`ScrollbackLog::get_line`] never hands out a stale view.

use crate::ring::{RingBuffer, RingBufferError};

/// Default byte budget for the scrollback log.
pub const DEFAULT_MAX_BYTES: usize = 320_000;

/// Default line budget for the scrollback log.
pub const DEFAULT_MAX_LINES: usize = 2_000;

/// Location of one line inside the byte log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineRecord {
    /// Element index in the byte log where the line starts.
    pub offset: usize,
    /// Length of the line in bytes.
    pub length: usize,
    /// Absolute byte-stream position of the first byte.
    pub origin: u64,
}

/// Borrowed view of one stored line.
///
/// The bytes may straddle the physical end of the log, so the view is made
/// of two slices; the second is empty when the line is contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineView<'a> {
    head: &'a [u8],
    tail: &'a [u8],
}

impl<'a> LineView<'a> {
    /// Line length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    /// Whether the line is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The two physical parts of the line, in order.
    #[must_use]
    pub fn as_slices(&self) -> (&'a [u8], &'a [u8]) {
        (self.head, self.tail)
    }

    /// Iterate over the line bytes.
    pub fn iter(&self) -> impl Iterator<Item = u8> + 'a {
        self.head.iter().chain(self.tail.iter()).copied()
    }

    /// Copy the line into an owned buffer.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(self.head);
        out.extend_from_slice(self.tail);
        out
    }
}

impl PartialEq<[u8]> for LineView<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter().copied())
    }
}

/// Bounded, most-recent-first history of lines.
#[derive(Debug, Clone)]
pub struct ScrollbackLog {
    log: RingBuffer<u8>,
    index: RingBuffer<LineRecord>,
    max_bytes: usize,
    max_lines: usize,
    line_count: usize,
}

impl ScrollbackLog {
    /// Create a log holding at most `max_bytes` bytes and `max_lines` lines.
    ///
    /// Both rings get one spare slot so the full budget is usable.
    pub fn new(max_bytes: usize, max_lines: usize) -> Result<Self, RingBufferError> {
        let log = RingBuffer::new(max_bytes.saturating_add(1))?;
        let index = RingBuffer::new(max_lines.saturating_add(1))?;
        Ok(Self {
            log,
            index,
            max_bytes,
            max_lines,
            line_count: 0,
        })
    }

    /// Append a line.
    ///
    /// Lines longer than the byte budget keep only their last `max_bytes`
    /// bytes.
    pub fn add_line(&mut self, bytes: &[u8]) {
        if self.max_lines == 0 {
            return;
        }
        let kept = &bytes[bytes.len().saturating_sub(self.max_bytes)..];
        let record = LineRecord {
            offset: self.log.put_index(),
            length: kept.len(),
            origin: self.log.total_written(),
        };
        self.log.force_put(kept);
        self.index.force_put(&[record]);
        self.line_count = (self.line_count + 1).min(self.max_lines);
        self.check_clean();
    }

    /// Fetch the `n`-th most recent line (`0` is the newest).
    #[must_use]
    pub fn get_line(&self, n: usize) -> Option<LineView<'_>> {
        if n >= self.line_count {
            return None;
        }
        let record = *self.index.peek_back(n);
        let (head, tail) = self.log.slices_at(record.offset, record.length);
        Some(LineView { head, tail })
    }

    /// Drop lines whose bytes the log has since overwritten.
    ///
    /// Returns the number of lines purged.
    pub fn check_clean(&mut self) -> usize {
        let mut purged = 0;
        while self.line_count > 0 {
            let oldest = *self.index.peek_back(self.line_count - 1);
            if self.is_live(&oldest) {
                break;
            }
            self.line_count -= 1;
            purged += 1;
        }
        if purged > 0 {
            tracing::trace!(purged, remaining = self.line_count, "scrollback purge");
        }
        purged
    }

    fn is_live(&self, record: &LineRecord) -> bool {
        let end = record.origin + record.length as u64;
        self.log.total_written().saturating_sub(record.origin) <= self.max_bytes as u64
            && end <= self.log.total_written()
    }

    /// Number of retrievable lines.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Whether no lines are stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_count == 0
    }

    /// Byte budget.
    #[inline]
    #[must_use]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Line budget.
    #[inline]
    #[must_use]
    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Forget every stored line.
    pub fn clear(&mut self) {
        self.log.clear();
        self.index.clear();
        self.line_count = 0;
    }

    /// Iterate lines newest first.
    pub fn iter(&self) -> impl Iterator<Item = LineView<'_>> + '_ {
        (0..self.line_count).filter_map(move |n| self.get_line(n))
    }
}
