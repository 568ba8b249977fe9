//! ANSI escape handling outside VT100 mode.
//!
//! `ESC` puts the machine in [`EscapeState::Pending`]. A following `[`
//! starts CSI accumulation; any other byte is handed back to the emulator
//! (it may be a TextFX command letter).
//!
//! SGR is applied cumulatively, left to right, starting from the surface's
//! current attribute. Unlike VT100 no rendition mask is kept: underline
//! picks its foreground from the bright bit of the running attribute.

use crate::attr::{ANSI_TO_VGA, TextAttr, VtAttr};
use crate::params::ParamString;
use crate::reply::{ReplyContext, ReplyQueue, TerminalQuery};
use crate::surface::DisplaySurface;
use crate::vt100::csi_common;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum EscapeState {
    #[default]
    Idle,
    Pending,
    Csi,
}

/// What happened to a byte fed while an escape was active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EscapeOutcome {
    Consumed,
    /// The byte after `ESC` was not `[`; the escape is over and the byte is
    /// still unhandled.
    NotCsi,
}

#[derive(Debug, Clone)]
pub(crate) struct Ansi {
    state: EscapeState,
    params: ParamString,
    saved_x: u16,
    saved_y: u16,
}

impl Default for Ansi {
    fn default() -> Self {
        Self {
            state: EscapeState::Idle,
            params: ParamString::new(),
            saved_x: 1,
            saved_y: 1,
        }
    }
}

impl Ansi {
    pub(crate) fn is_active(&self) -> bool {
        self.state != EscapeState::Idle
    }

    pub(crate) fn begin(&mut self) {
        self.state = EscapeState::Pending;
    }

    pub(crate) fn abort(&mut self) {
        self.state = EscapeState::Idle;
        self.params.clear();
    }

    pub(crate) fn feed<S: DisplaySurface + ?Sized>(
        &mut self,
        s: &mut S,
        b: u8,
        replies: &mut ReplyQueue,
    ) -> EscapeOutcome {
        match self.state {
            EscapeState::Idle => EscapeOutcome::NotCsi,
            EscapeState::Pending => {
                if b == b'[' {
                    self.params.clear();
                    self.state = EscapeState::Csi;
                    EscapeOutcome::Consumed
                } else {
                    self.state = EscapeState::Idle;
                    EscapeOutcome::NotCsi
                }
            }
            EscapeState::Csi => {
                if b.is_ascii_digit() || b == b';' {
                    self.params.push(b);
                } else if b != b'?' {
                    self.state = EscapeState::Idle;
                    self.dispatch(s, b, replies);
                    self.params.clear();
                }
                EscapeOutcome::Consumed
            }
        }
    }

    fn dispatch<S: DisplaySurface + ?Sized>(
        &mut self,
        s: &mut S,
        cmd: u8,
        replies: &mut ReplyQueue,
    ) {
        match cmd {
            b'm' => self.sgr(s),
            b'H' | b'f' => {
                let y = self.params.next_param();
                let x = self.params.next_param();
                s.goto_xy(x, y);
            }
            b's' => {
                self.saved_x = s.cursor_x();
                self.saved_y = s.cursor_y();
            }
            b'u' => s.goto_xy(self.saved_x, self.saved_y),
            b'n' => {
                let query = TerminalQuery::from_dsr(self.params.next_param());
                let context = ReplyContext {
                    cursor_x: s.cursor_x(),
                    cursor_y: s.cursor_y(),
                };
                replies.answer(query, context);
            }
            b'h' | b'l' => {}
            _ => {
                if !csi_common(s, cmd, &mut self.params) {
                    tracing::trace!(byte = cmd, "unknown ansi csi");
                }
            }
        }
    }

    fn sgr<S: DisplaySurface + ?Sized>(&mut self, s: &mut S) {
        let mut attr = s.attribute();
        if self.params.is_empty() {
            attr = sgr_step(attr, 0);
        }
        while !self.params.is_empty() {
            attr = sgr_step(attr, self.params.next_param());
        }
        s.set_attribute(attr);
    }
}

fn sgr_step(attr: TextAttr, code: u16) -> TextAttr {
    match code {
        0 => TextAttr::DEFAULT,
        1 => attr.bright(),
        4 => {
            let mut rendition = VtAttr::UNDERLINE;
            rendition.set(VtAttr::BOLD, attr.fg() & 0x08 != 0);
            attr.with_fg(rendition.to_text_attr().fg())
        }
        5 => attr.with_blink(),
        7 => attr.reversed(),
        30..=37 => attr.with_base_fg(ANSI_TO_VGA[usize::from(code - 30)]),
        40..=47 => attr.with_bg(ANSI_TO_VGA[usize::from(code - 40)]),
        _ => attr,
    }
}
