//! VT100 state machine.
//!
//! ```text
//! Ground --ESC--> Escape --'['--> Csi --final--> Ground
//!                    |--'(' / ')'--> Charset --any--> Ground
//!                    `--command--> Ground
//! ```
//!
//! Renditions are tracked as a [`VtAttr`] mask and folded into the color
//! attribute through [`VtAttr::to_text_attr`].

use crate::attr::{ANSI_TO_VGA, TextAttr, VtAttr};
use crate::emulator::{ESC, move_by, tab};
use crate::params::ParamString;
use crate::surface::DisplaySurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum VtState {
    #[default]
    Ground,
    Escape,
    Csi,
    /// Waiting for the character-set designator after `ESC (` / `ESC )`.
    Charset,
}

#[derive(Debug, Clone)]
pub(crate) struct Vt100 {
    state: VtState,
    params: ParamString,
    saved_x: u16,
    saved_y: u16,
    saved_attr: TextAttr,
    rendition: VtAttr,
}

impl Default for Vt100 {
    fn default() -> Self {
        Self {
            state: VtState::Ground,
            params: ParamString::new(),
            saved_x: 1,
            saved_y: 1,
            saved_attr: TextAttr::DEFAULT,
            rendition: VtAttr::empty(),
        }
    }
}

impl Vt100 {
    pub(crate) fn is_idle(&self) -> bool {
        self.state == VtState::Ground
    }

    pub(crate) fn abort(&mut self) {
        self.state = VtState::Ground;
        self.params.clear();
    }

    pub(crate) fn feed<S: DisplaySurface + ?Sized>(&mut self, s: &mut S, b: u8) {
        match self.state {
            VtState::Ground => self.ground(s, b),
            VtState::Escape => self.escape(s, b),
            VtState::Csi => self.csi(s, b),
            VtState::Charset => {
                // Designators are accepted and ignored.
                self.state = VtState::Ground;
            }
        }
    }

    fn ground<S: DisplaySurface + ?Sized>(&mut self, s: &mut S, b: u8) {
        match b {
            ESC => self.state = VtState::Escape,
            0x09 => tab(s),
            0x0c => s.clear_screen(),
            0x0f => {}
            0x02 => self.toggle(s, VtAttr::BOLD),
            0x16 => self.toggle(s, VtAttr::REVERSE),
            0x1f => self.toggle(s, VtAttr::UNDERLINE),
            _ => s.write_char(b),
        }
    }

    fn toggle<S: DisplaySurface + ?Sized>(&mut self, s: &mut S, flag: VtAttr) {
        self.rendition.toggle(flag);
        s.set_attribute(self.rendition.to_text_attr());
    }

    fn escape<S: DisplaySurface + ?Sized>(&mut self, s: &mut S, b: u8) {
        self.state = VtState::Ground;
        match b {
            b'[' => {
                self.params.clear();
                self.state = VtState::Csi;
            }
            b'c' => *self = Self::default(),
            b'D' => s.scroll_down(s.cursor_y(), 1),
            b'M' => {
                s.scroll_up(s.cursor_y(), 1);
                s.goto_xy(1, 1);
            }
            b'E' => s.write_char(b'\n'),
            b'7' => {
                self.saved_x = s.cursor_x();
                self.saved_y = s.cursor_y();
                self.saved_attr = s.attribute();
            }
            b'8' => {
                s.goto_xy(self.saved_x, self.saved_y);
                s.set_attribute(self.saved_attr);
            }
            b'A' => move_by(s, 0, -1),
            b'B' => move_by(s, 0, 1),
            b'C' => move_by(s, 1, 0),
            b'H' => s.goto_xy(1, 1),
            b'K' => s.clear_to_eol(),
            b'(' | b')' => self.state = VtState::Charset,
            _ => tracing::trace!(byte = b, "unknown vt100 escape"),
        }
    }

    fn csi<S: DisplaySurface + ?Sized>(&mut self, s: &mut S, b: u8) {
        if b.is_ascii_digit() || b == b';' {
            self.params.push(b);
            return;
        }
        self.state = VtState::Ground;
        match b {
            b'm' => {
                if self.params.is_empty() {
                    self.sgr(s, 0);
                }
                while !self.params.is_empty() {
                    let code = self.params.next_param();
                    self.sgr(s, code);
                }
            }
            b'H' | b'f' => {
                let row = self.params.next_param();
                if row == 0 {
                    s.goto_xy(1, 1);
                } else {
                    let col = self.params.next_param();
                    s.goto_xy(col, row);
                }
            }
            _ => {
                if !csi_common(s, b, &mut self.params) {
                    tracing::trace!(byte = b, "unknown vt100 csi");
                }
            }
        }
        self.params.clear();
    }

    /// Apply one SGR code.
    pub(crate) fn sgr<S: DisplaySurface + ?Sized>(&mut self, s: &mut S, code: u16) {
        match code {
            0 => {
                s.set_attribute(TextAttr::DEFAULT);
                self.rendition = VtAttr::empty();
            }
            1 => {
                s.set_attribute(s.attribute().bright());
                self.rendition |= VtAttr::BOLD;
                if self
                    .rendition
                    .intersects(VtAttr::REVERSE | VtAttr::UNDERLINE)
                {
                    s.set_attribute(self.rendition.to_text_attr());
                }
            }
            2 | 4 | 5 | 7 | 8 => {
                let flag = match code {
                    2 => VtAttr::LOWINT,
                    4 => VtAttr::UNDERLINE,
                    5 => VtAttr::BLINK,
                    7 => VtAttr::REVERSE,
                    _ => VtAttr::INVISIBLE,
                };
                self.rendition |= flag;
                s.set_attribute(self.rendition.to_text_attr());
            }
            30..=37 => {
                let color = ANSI_TO_VGA[usize::from(code - 30)];
                s.set_attribute(s.attribute().with_base_fg(color));
            }
            40..=47 => s.set_background(ANSI_TO_VGA[usize::from(code - 40)]),
            _ => {}
        }
    }
}

/// CSI commands shared by the VT100 and ANSI dialects: relative moves,
/// erase in display/line and the scroll region.
///
/// Returns `false` for any other final byte.
pub(crate) fn csi_common<S: DisplaySurface + ?Sized>(
    s: &mut S,
    cmd: u8,
    params: &mut ParamString,
) -> bool {
    match cmd {
        b'A' | b'B' | b'C' | b'D' => {
            let n = i32::from(params.next_param().max(1));
            match cmd {
                b'A' => move_by(s, 0, -n),
                b'B' => move_by(s, 0, n),
                b'C' => move_by(s, n, 0),
                _ => move_by(s, -n, 0),
            }
        }
        b'J' => match params.next_param() {
            0 => s.clear_below(),
            1 => s.clear_above(),
            2 => s.clear_screen(),
            _ => {}
        },
        b'K' => {
            if params.next_param() == 0 {
                s.clear_to_eol();
            }
        }
        b'r' => {
            // Missing margins default to the screen edges.
            let top = params.next_param().max(1);
            let bottom = match params.next_param() {
                0 => s.screen_rows(),
                n => n,
            };
            s.set_window(1, top, s.screen_cols(), bottom);
            s.goto_xy(1, 1);
        }
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::{Emulator, EmulatorConfig};
    use crate::modes::Dialects;
    use crate::surface::testing::{Call, Recorder};

    fn vt() -> Emulator {
        Emulator::with_config(EmulatorConfig {
            dialects: Dialects::VT100,
            ..EmulatorConfig::default()
        })
    }

    fn feed(bytes: &[u8]) -> Recorder {
        let mut rec = Recorder::new(80, 25);
        vt().feed_bytes(&mut rec, bytes);
        rec
    }

    #[test]
    fn cursor_position_row_then_column() {
        let rec = feed(b"\x1b[2;5H");
        assert_eq!((rec.x, rec.y), (5, 2));
    }

    #[test]
    fn cursor_position_zero_row_homes() {
        let mut rec = Recorder::new(80, 25);
        rec.x = 10;
        rec.y = 10;
        vt().feed_bytes(&mut rec, b"\x1b[;7f");
        assert_eq!((rec.x, rec.y), (1, 1));
    }

    #[test]
    fn relative_moves_default_to_one() {
        let mut rec = Recorder::new(80, 25);
        rec.x = 10;
        rec.y = 10;
        let mut emu = vt();
        emu.feed_bytes(&mut rec, b"\x1b[A");
        assert_eq!(rec.y, 9);
        emu.feed_bytes(&mut rec, b"\x1b[0B\x1b[3C\x1b[2D");
        assert_eq!((rec.x, rec.y), (11, 10));
    }

    #[test]
    fn sgr_bold_underline_uses_precedence_table() {
        let rec = feed(b"\x1b[1;4m");
        assert_eq!(rec.attr, TextAttr(0x0B));
    }

    #[test]
    fn sgr_empty_resets() {
        let rec = feed(b"\x1b[1;44m\x1b[m");
        assert_eq!(rec.attr, TextAttr::DEFAULT);
    }

    #[test]
    fn sgr_colors() {
        let rec = feed(b"\x1b[31;44m");
        assert_eq!(rec.attr, TextAttr(0x14));
        let rec = feed(b"\x1b[1;32m");
        assert_eq!(rec.attr, TextAttr(0x0A));
    }

    #[test]
    fn sgr_reverse_and_blink() {
        let rec = feed(b"\x1b[7m");
        assert_eq!(rec.attr, TextAttr(0x10));
        let rec = feed(b"\x1b[5m");
        assert_eq!(rec.attr, TextAttr(0x87));
    }

    #[test]
    fn erase_commands() {
        let rec = feed(b"\x1b[J\x1b[1J\x1b[2J\x1b[K\x1b[1K");
        assert_eq!(
            rec.calls,
            vec![
                Call::ClearBelow,
                Call::ClearAbove,
                Call::ClearScreen,
                Call::ClearEol
            ]
        );
    }

    #[test]
    fn scroll_region_sets_window_then_homes() {
        let rec = feed(b"\x1b[5;20r");
        assert_eq!(
            rec.calls,
            vec![Call::Window(1, 5, 80, 20), Call::Goto(1, 1)]
        );
        let rec = feed(b"\x1b[r");
        assert_eq!(
            rec.calls,
            vec![Call::Window(1, 1, 80, 25), Call::Goto(1, 1)]
        );
    }

    #[test]
    fn single_byte_escapes() {
        let mut rec = Recorder::new(80, 25);
        rec.y = 4;
        vt().feed_bytes(&mut rec, b"\x1bD\x1bM\x1bEx");
        assert_eq!(
            rec.calls,
            vec![
                Call::ScrollDown(4, 1),
                Call::ScrollUp(4, 1),
                Call::Goto(1, 1),
                Call::Write(b'\n'),
                Call::Write(b'x'),
            ]
        );
    }

    #[test]
    fn save_and_restore_cursor_and_attribute() {
        let mut rec = Recorder::new(80, 25);
        let mut emu = vt();
        emu.feed_bytes(&mut rec, b"\x1b[3;4H\x1b[31m\x1b7\x1b[H\x1b[0m\x1b8");
        assert_eq!((rec.x, rec.y), (4, 3));
        assert_eq!(rec.attr, TextAttr(0x04));
    }

    #[test]
    fn charset_designation_consumes_one_byte() {
        let rec = feed(b"\x1b(Bok");
        assert_eq!(rec.written(), b"ok");
    }

    #[test]
    fn control_toggles() {
        let mut rec = Recorder::new(80, 25);
        let mut emu = vt();
        emu.feed_bytes(&mut rec, b"\x02");
        assert_eq!(rec.attr, TextAttr(0x0F));
        emu.feed_bytes(&mut rec, b"\x1f");
        assert_eq!(rec.attr, TextAttr(0x0B));
        emu.feed_bytes(&mut rec, b"\x02\x1f");
        assert_eq!(rec.attr, TextAttr(0x07));
        emu.feed_bytes(&mut rec, b"\x0f");
        assert!(rec.written().is_empty());
    }

    #[test]
    fn unknown_final_byte_aborts_silently() {
        let rec = feed(b"\x1b[99Zx");
        assert_eq!(rec.written(), b"x");
    }

    #[test]
    fn reset_escape_clears_saved_state() {
        let mut rec = Recorder::new(80, 25);
        let mut emu = vt();
        emu.feed_bytes(&mut rec, b"\x1b[5;5H\x1b7\x1bc\x1b8");
        assert_eq!((rec.x, rec.y), (1, 1));
    }
}
