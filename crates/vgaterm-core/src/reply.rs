//! Replies the emulator sends back to the host.
//!
//! Supported requests:
//! - ANSI device status: `CSI 5 n` -> `CSI 0 n`
//! - ANSI cursor position: `CSI n` with any other parameter -> `CSI {y};{x} R`
//! - TextFX environment: `ESC E` -> `ESC "ENV" {ident} NUL`
//! - TextFX version: `ESC V` -> `ESC "TFX" 0x02`
//!
//! Replies are queued in FIFO order and drained by the host, which is
//! expected to write them back over the connection. The queue holds at most
//! [`MAX_PENDING_REPLIES`]; past that the oldest reply is dropped.

use std::collections::VecDeque;

/// Identification string sent for the TextFX `E` query.
pub const DEFAULT_IDENT: &str = "vgaterm v1.00";

/// TextFX protocol level reported by `V`.
pub const TEXTFX_LEVEL: u8 = 2;

/// Replies kept while the host is not draining.
pub const MAX_PENDING_REPLIES: usize = 64;

/// A request the emulator answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalQuery {
    /// `CSI 5 n`.
    DeviceStatus,
    /// `CSI 6 n` (or any non-5 parameter).
    CursorPosition,
    /// TextFX `E`.
    TextFxEnvironment,
    /// TextFX `V`.
    TextFxVersion,
}

impl TerminalQuery {
    /// Classify a device-status request by its first parameter.
    #[must_use]
    pub fn from_dsr(param: u16) -> Self {
        if param == 5 {
            Self::DeviceStatus
        } else {
            Self::CursorPosition
        }
    }
}

/// Cursor state needed to build a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyContext {
    /// Window-relative 1-based column.
    pub cursor_x: u16,
    /// Window-relative 1-based row.
    pub cursor_y: u16,
}

/// Reply encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEngine {
    /// Identification string for the TextFX environment reply.
    pub ident: String,
}

impl Default for ReplyEngine {
    fn default() -> Self {
        Self {
            ident: DEFAULT_IDENT.to_owned(),
        }
    }
}

impl ReplyEngine {
    /// Encode the reply for `query`.
    #[must_use]
    pub fn reply_for_query(&self, query: TerminalQuery, context: ReplyContext) -> Vec<u8> {
        match query {
            TerminalQuery::DeviceStatus => b"\x1b[0n".to_vec(),
            TerminalQuery::CursorPosition => {
                format!("\x1b[{};{}R", context.cursor_y, context.cursor_x).into_bytes()
            }
            TerminalQuery::TextFxEnvironment => {
                let mut out = Vec::with_capacity(self.ident.len() + 5);
                out.extend_from_slice(b"\x1bENV");
                out.extend_from_slice(self.ident.as_bytes());
                out.push(0);
                out
            }
            TerminalQuery::TextFxVersion => vec![0x1b, b'T', b'F', b'X', TEXTFX_LEVEL],
        }
    }
}

/// FIFO of encoded replies waiting for the host.
#[derive(Debug, Clone, Default)]
pub struct ReplyQueue {
    engine: ReplyEngine,
    pending: VecDeque<Vec<u8>>,
}

impl ReplyQueue {
    #[must_use]
    pub fn new(engine: ReplyEngine) -> Self {
        Self {
            engine,
            pending: VecDeque::new(),
        }
    }

    /// Encode and enqueue the reply to `query`, dropping the oldest reply
    /// when the queue is full.
    pub fn answer(&mut self, query: TerminalQuery, context: ReplyContext) {
        let reply = self.engine.reply_for_query(query, context);
        if self.pending.len() >= MAX_PENDING_REPLIES {
            self.pending.pop_front();
            tracing::debug!(?query, "reply queue full, dropped oldest reply");
        }
        tracing::trace!(?query, len = reply.len(), "queued reply");
        self.pending.push_back(reply);
    }

    /// Take every queued reply in FIFO order.
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.pending).into()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
