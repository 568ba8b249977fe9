//! Numeric parameter accumulator for CSI sequences.
//!
//! Digits and separators are appended as they arrive; once the terminator is
//! seen, [`ParamString::next_param`] walks the `;`-separated list left to
//! right. Each call takes the maximal leading decimal run (empty run = 0)
//! and skips one separator, so `"1;;5"` yields 1, 0, 5.

/// Upper bound on accumulated parameter bytes; further bytes are dropped.
pub const MAX_PARAM_BYTES: usize = 64;

/// Accumulated parameter bytes and a read position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamString {
    bytes: Vec<u8>,
    pos: usize,
}

impl ParamString {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one byte. Returns `false` when the accumulator is full.
    pub fn push(&mut self, b: u8) -> bool {
        if self.bytes.len() >= MAX_PARAM_BYTES {
            return false;
        }
        self.bytes.push(b);
        true
    }

    /// Consume and return the next parameter, saturating at `u16::MAX`.
    pub fn next_param(&mut self) -> u16 {
        let rest = &self.bytes[self.pos..];
        let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
        let value = rest[..digits].iter().fold(0u16, |acc, &b| {
            acc.saturating_mul(10).saturating_add(u16::from(b - b'0'))
        });
        self.pos += digits;
        if self.pos < self.bytes.len() {
            // separator
            self.pos += 1;
        }
        value
    }

    /// Whether every parameter has been consumed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Unconsumed bytes.
    #[must_use]
    pub fn remaining(&self) -> &[u8] {
        &self.bytes[self.pos.min(self.bytes.len())..]
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.pos = 0;
    }
}
