//! TextFX: `ESC <letter> <raw parameter bytes>`.
//!
//! Each command letter has a fixed parameter byte count. Parameter bytes are
//! taken verbatim, so any byte value (including ESC) may appear in them.
//! `G` is the one variable-length command: its second header byte decides
//! how many glyph bytes follow.

use crate::attr::TextAttr;
use crate::emulator::{Stage, move_by};
use crate::palette::{DEFAULT_PALETTE_BYTES, Palette, StockPalette};
use crate::reply::{ReplyContext, ReplyQueue, TerminalQuery};
use crate::surface::DisplaySurface;

/// Number of user palette slots (`'1'..='3'`).
pub const USER_PALETTES: usize = 3;

/// Steps in a palette morph.
pub const MORPH_STEPS: u8 = 63;

/// Glyph height used by the font commands (`F`, `G`).
const FONT_HEIGHT: usize = 16;

/// Raw parameter bytes required after command letter `cmd`, or `None` for an
/// unknown letter.
#[must_use]
pub fn param_count(cmd: u8) -> Option<usize> {
    let n = match cmd {
        b'a' | b'b' | b'c' | b'd' | b'E' | b'h' | b'i' | b'I' | b'j' | b'J' | b'k' | b'K'
        | b'n' | b'N' | b's' | b'S' | b't' | b'u' | b'V' | b'Z' => 0,
        b'A' | b'B' | b'C' | b'D' | b'l' | b'M' | b'p' | b'Q' | b'T' | b'U' => 1,
        b'G' | b'H' | b'r' => 2,
        b'z' | b'X' => 3,
        b'R' | b'W' => 4,
        b'P' => DEFAULT_PALETTE_BYTES,
        b'F' => 4096,
        _ => return None,
    };
    Some(n)
}

#[derive(Debug, Clone)]
pub(crate) struct TextFx {
    stage: Stage,
    params: Vec<u8>,
    default_attr: TextAttr,
    saved_x: u16,
    saved_y: u16,
    saved_attr: TextAttr,
    user_palettes: [Palette; USER_PALETTES],
}

impl TextFx {
    pub(crate) fn new(default_attr: TextAttr) -> Self {
        Self {
            stage: Stage::Idle,
            params: Vec::new(),
            default_attr,
            saved_x: 1,
            saved_y: 1,
            saved_attr: default_attr,
            user_palettes: std::array::from_fn(|_| Palette::default()),
        }
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.stage.is_idle()
    }

    pub(crate) fn is_collecting(&self) -> bool {
        matches!(self.stage, Stage::CollectingParams { .. })
    }

    pub(crate) fn is_awaiting_command(&self) -> bool {
        self.stage == Stage::AwaitingCommand
    }

    pub(crate) fn await_command(&mut self) {
        self.stage = Stage::AwaitingCommand;
    }

    pub(crate) fn abort(&mut self) {
        self.stage = Stage::Idle;
        self.params.clear();
    }

    /// Handle the command letter.
    pub(crate) fn command<S: DisplaySurface + ?Sized>(
        &mut self,
        s: &mut S,
        cmd: u8,
        replies: &mut ReplyQueue,
    ) {
        self.params.clear();
        match param_count(cmd) {
            None => {
                tracing::trace!(byte = cmd, "unknown textfx command");
                self.stage = Stage::Idle;
            }
            Some(0) => {
                self.stage = Stage::Idle;
                self.dispatch(s, cmd, replies);
            }
            Some(need) => {
                self.params.reserve(need);
                self.stage = Stage::CollectingParams {
                    command: cmd,
                    have: 0,
                    need,
                };
            }
        }
    }

    /// Collect one parameter byte, dispatching once the command is complete.
    pub(crate) fn feed<S: DisplaySurface + ?Sized>(
        &mut self,
        s: &mut S,
        b: u8,
        replies: &mut ReplyQueue,
    ) {
        let Stage::CollectingParams {
            command,
            mut have,
            mut need,
        } = self.stage
        else {
            return;
        };
        self.params.push(b);
        have += 1;
        if command == b'G' && have == 2 && need == 2 {
            need += (usize::from(b) + 1) * FONT_HEIGHT;
        }
        if have < need {
            self.stage = Stage::CollectingParams {
                command,
                have,
                need,
            };
            return;
        }
        self.stage = Stage::Idle;
        self.dispatch(s, command, replies);
        self.params.clear();
    }

    fn param(&self, i: usize) -> u8 {
        self.params.get(i).copied().unwrap_or(0)
    }

    fn dispatch<S: DisplaySurface + ?Sized>(
        &mut self,
        s: &mut S,
        cmd: u8,
        replies: &mut ReplyQueue,
    ) {
        let p0 = i32::from(self.param(0));
        match cmd {
            b'a' => move_by(s, 0, -1),
            b'A' => move_by(s, 0, -p0),
            b'b' => move_by(s, 0, 1),
            b'B' => move_by(s, 0, p0),
            b'c' => move_by(s, 1, 0),
            b'C' => move_by(s, p0, 0),
            b'd' => move_by(s, -1, 0),
            b'D' => move_by(s, -p0, 0),
            b'E' | b'V' => {
                let query = if cmd == b'E' {
                    TerminalQuery::TextFxEnvironment
                } else {
                    TerminalQuery::TextFxVersion
                };
                let context = ReplyContext {
                    cursor_x: s.cursor_x(),
                    cursor_y: s.cursor_y(),
                };
                replies.answer(query, context);
            }
            b'F' => match s.load_font(&self.params, 8, 16) {
                Ok(()) => {
                    tracing::debug!("textfx font loaded");
                    s.refresh();
                }
                Err(err) => tracing::warn!(%err, "rejected textfx font"),
            },
            b'G' => {
                let start = self.param(0);
                let count = usize::from(self.param(1)) + 1;
                match s.patch_font_range(&self.params[2..], start, count) {
                    Ok(()) => {
                        tracing::debug!(start, count, "textfx glyphs patched");
                        s.refresh();
                    }
                    Err(err) => tracing::warn!(%err, "rejected textfx glyphs"),
                }
            }
            b'h' => s.goto_xy(1, 1),
            b'H' => s.goto_xy(u16::from(self.param(0)), u16::from(self.param(1))),
            b'i' => s.set_attribute(self.saved_attr),
            b'I' => self.saved_attr = s.attribute(),
            b'j' => {
                s.set_attribute(self.default_attr);
                s.clear_screen();
            }
            b'J' => s.clear_screen(),
            b'k' => {
                s.set_attribute(self.default_attr);
                s.clear_to_eol();
            }
            b'K' => s.clear_to_eol(),
            b'l' => self.default_attr = TextAttr(self.param(0)),
            b'M' => s.set_attribute(TextAttr(self.param(0))),
            b'n' => s.cursor_hide(),
            b'N' => s.cursor_show(),
            b'p' => {
                let name = self.param(0);
                // 'C' names the active palette; selecting it changes nothing.
                if name != b'C'
                    && let Some(pal) = self.named_palette(s, name)
                {
                    tracing::debug!(name = %char::from(name), "textfx palette selected");
                    s.set_palette(&pal);
                    s.refresh();
                }
            }
            b'P' => {
                let mut pal = s.palette().clone();
                match pal.load(&self.params) {
                    Ok(()) => {
                        s.set_palette(&pal);
                        s.refresh();
                    }
                    Err(err) => tracing::warn!(%err, "rejected textfx palette"),
                }
            }
            b'Q' => {
                if let Some(slot) = user_slot(self.param(0)) {
                    self.user_palettes[slot].clone_from(s.palette());
                    tracing::debug!(slot = slot + 1, "textfx palette saved");
                }
            }
            b'r' => {
                let ch = self.param(0);
                // NUL terminates the run before it starts.
                if ch != 0 {
                    for _ in 0..self.param(1) {
                        s.write_char(ch);
                    }
                }
            }
            b'R' => {
                let mut pal = s.palette().clone();
                pal.set_reg(self.param(0), self.param(1), self.param(2), self.param(3));
                s.set_palette(&pal);
                s.refresh();
            }
            b's' => s.goto_xy(self.saved_x, self.saved_y),
            b'S' => {
                self.saved_x = s.cursor_x();
                self.saved_y = s.cursor_y();
            }
            b't' => s.scroll_down(s.cursor_y(), 1),
            b'T' => s.scroll_down(s.cursor_y(), u16::from(self.param(0))),
            b'u' => s.scroll_up(s.cursor_y(), 1),
            b'U' => s.scroll_up(s.cursor_y(), u16::from(self.param(0))),
            b'W' => s.set_window(
                u16::from(self.param(0)),
                u16::from(self.param(1)),
                u16::from(self.param(2)),
                u16::from(self.param(3)),
            ),
            b'X' => self.morph(s),
            b'z' => {
                let mut refresh = false;
                if self.param(0) != 0 {
                    s.set_window(1, 1, s.screen_cols(), s.screen_rows());
                }
                if self.param(1) != 0 {
                    s.set_palette(StockPalette::Default.get());
                    refresh = true;
                }
                if self.param(2) != 0 {
                    s.load_default_font();
                    refresh = true;
                }
                if refresh {
                    s.refresh();
                }
            }
            b'Z' => {
                s.set_window(1, 1, s.screen_cols(), s.screen_rows());
                s.set_ice_color(true);
                s.set_attribute(self.default_attr);
                s.set_palette(StockPalette::Default.get());
                s.clear_screen();
                s.load_default_font();
                s.refresh();
            }
            _ => {}
        }
    }

    /// `X from to stride`: fade from one named palette to another.
    fn morph<S: DisplaySurface + ?Sized>(&self, s: &mut S) {
        let (from, to, stride) = (self.param(0), self.param(1), self.param(2));
        if stride == 0 {
            return;
        }
        let interval = (MORPH_STEPS / stride).max(1);
        let (Some(mut pal), Some(target)) =
            (self.named_palette(s, from), self.named_palette(s, to))
        else {
            tracing::trace!(from, to, "textfx morph with unknown palette");
            return;
        };
        tracing::debug!(from = %char::from(from), to = %char::from(to), stride, "textfx morph");
        s.set_palette(&pal);
        s.refresh();
        for step in 0..MORPH_STEPS {
            pal.morph_step(&target);
            s.set_palette(&pal);
            if step % interval == 0 {
                s.refresh();
            }
        }
    }

    /// Resolve a palette name: user slots `'1'..='3'`, stock `A` white,
    /// `B` black, `C` current, `D` default, `E` greyscale.
    fn named_palette<S: DisplaySurface + ?Sized>(&self, s: &S, name: u8) -> Option<Palette> {
        if let Some(slot) = user_slot(name) {
            return Some(self.user_palettes[slot].clone());
        }
        let stock = match name {
            b'A' => StockPalette::White,
            b'B' => StockPalette::Black,
            b'C' => return Some(s.palette().clone()),
            b'D' => StockPalette::Default,
            b'E' => StockPalette::Greyscale,
            _ => return None,
        };
        Some(stock.get().clone())
    }
}

fn user_slot(name: u8) -> Option<usize> {
    let slot = usize::from(name.checked_sub(b'1')?);
    (slot < USER_PALETTES).then_some(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::Emulator;
    use crate::palette::Rgb;
    use crate::surface::testing::{Call, Recorder};

    fn setup() -> (Emulator, Recorder) {
        (Emulator::new(), Recorder::new(80, 25))
    }

    fn refreshes(calls: &[Call]) -> usize {
        calls.iter().filter(|c| **c == Call::Refresh).count()
    }

    #[test]
    fn parameter_counts() {
        assert_eq!(param_count(b'a'), Some(0));
        assert_eq!(param_count(b'Z'), Some(0));
        assert_eq!(param_count(b'M'), Some(1));
        assert_eq!(param_count(b'H'), Some(2));
        assert_eq!(param_count(b'X'), Some(3));
        assert_eq!(param_count(b'W'), Some(4));
        assert_eq!(param_count(b'P'), Some(192));
        assert_eq!(param_count(b'F'), Some(4096));
        assert_eq!(param_count(b'q'), None);
        assert_eq!(param_count(b'['), None);
    }

    #[test]
    fn palette_load_waits_for_every_byte() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bP");
        emu.feed_bytes(&mut rec, &[0x3f; 191]);
        assert!(rec.calls.is_empty());
        assert_eq!(
            emu.textfx_stage(),
            Stage::CollectingParams {
                command: b'P',
                have: 191,
                need: 192
            }
        );
        emu.feed(&mut rec, 0x3f);
        assert_eq!(rec.calls, vec![Call::SetPalette, Call::Refresh]);
        assert_eq!(rec.palette.reg(63), Rgb::new(63, 63, 63));
        assert_eq!(rec.palette.reg(0), Rgb::new(63, 63, 63));
        assert!(emu.is_idle());
    }

    #[test]
    fn parameter_bytes_are_raw() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bM\x1b");
        assert_eq!(rec.attr, TextAttr(0x1b));
        emu.feed_bytes(&mut rec, b"\x1br[\x03");
        assert_eq!(rec.written(), b"[[[");
    }

    #[test]
    fn cursor_commands() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bH\x0a\x0a");
        assert_eq!((rec.x, rec.y), (10, 10));
        emu.feed_bytes(&mut rec, b"\x1bA\x03\x1bc\x1bD\x05");
        assert_eq!((rec.x, rec.y), (6, 7));
        emu.feed_bytes(&mut rec, b"\x1bS\x1bh");
        assert_eq!((rec.x, rec.y), (1, 1));
        emu.feed_bytes(&mut rec, b"\x1bs");
        assert_eq!((rec.x, rec.y), (6, 7));
    }

    #[test]
    fn default_attribute_commands() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bl\x1e\x1bM\x4f\x1bI\x1bj");
        assert_eq!(rec.attr, TextAttr(0x1e));
        emu.feed_bytes(&mut rec, b"\x1bi");
        assert_eq!(rec.attr, TextAttr(0x4f));
        rec.take();
        emu.feed_bytes(&mut rec, b"\x1bk\x1bK\x1bJ");
        assert_eq!(
            rec.calls,
            vec![
                Call::SetAttr(0x1e),
                Call::ClearEol,
                Call::ClearEol,
                Call::ClearScreen
            ]
        );
    }

    #[test]
    fn scrolling_uses_cursor_row() {
        let (mut emu, mut rec) = setup();
        rec.y = 4;
        emu.feed_bytes(&mut rec, b"\x1bt\x1bT\x02\x1bu\x1bU\x03");
        assert_eq!(
            rec.calls,
            vec![
                Call::ScrollDown(4, 1),
                Call::ScrollDown(4, 2),
                Call::ScrollUp(4, 1),
                Call::ScrollUp(4, 3)
            ]
        );
    }

    #[test]
    fn window_and_cursor_visibility() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bW\x05\x02\x28\x14\x1bn\x1bN");
        assert_eq!(
            rec.calls,
            vec![
                Call::Window(5, 2, 40, 20),
                Call::CursorHide,
                Call::CursorShow
            ]
        );
    }

    #[test]
    fn glyph_patch_length_follows_header() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bG\x41\x01");
        emu.feed_bytes(&mut rec, &[0xff; 31]);
        assert!(rec.calls.is_empty());
        assert!(!emu.is_idle());
        emu.feed(&mut rec, 0xff);
        assert_eq!(rec.calls, vec![Call::PatchFont(0x41, 2), Call::Refresh]);
        assert!(emu.is_idle());
    }

    #[test]
    fn full_font_load() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bF");
        emu.feed_bytes(&mut rec, &[0u8; 4096]);
        assert_eq!(rec.calls, vec![Call::LoadFont(4096, 8, 16), Call::Refresh]);
    }

    #[test]
    fn identification_replies() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bE\x1bV");
        assert_eq!(
            emu.drain_replies(),
            vec![b"\x1bENVvgaterm v1.00\0".to_vec(), b"\x1bTFX\x02".to_vec()]
        );
    }

    #[test]
    fn user_palettes_round_trip() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bR\x01\x0a\x14\x1e\x1bQ2");
        assert_eq!(rec.palette.reg(1), Rgb::new(10, 20, 30));
        emu.feed_bytes(&mut rec, b"\x1bpD");
        assert_eq!(rec.palette, *StockPalette::Default.get());
        emu.feed_bytes(&mut rec, b"\x1bp2");
        assert_eq!(rec.palette.reg(1), Rgb::new(10, 20, 30));
        rec.take();
        emu.feed_bytes(&mut rec, b"\x1bpC\x1bp9");
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn untouched_user_slot_holds_default_palette() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bpA\x1bp3");
        assert_eq!(rec.palette, *StockPalette::Default.get());
    }

    #[test]
    fn morph_reaches_target() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bXBA\x3f");
        assert_eq!(refreshes(&rec.calls), 1 + usize::from(MORPH_STEPS));
        assert_eq!(rec.palette, *StockPalette::White.get());
    }

    #[test]
    fn morph_stride_throttles_refresh() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bXBA\x09");
        // interval 7: steps 0, 7, ..., 56 plus the initial paint
        assert_eq!(refreshes(&rec.calls), 10);
        rec.take();
        emu.feed_bytes(&mut rec, b"\x1bXBA\x00\x1bXB?\x01");
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn conditional_reset() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bz\x01\x00\x01");
        assert_eq!(
            rec.calls,
            vec![Call::Window(1, 1, 80, 25), Call::DefaultFont, Call::Refresh]
        );
        rec.take();
        emu.feed_bytes(&mut rec, b"\x1bz\x00\x00\x00");
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn hard_reset() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bl\x17\x1bZ");
        assert_eq!(
            rec.calls,
            vec![
                Call::Window(1, 1, 80, 25),
                Call::IceColor(true),
                Call::SetAttr(0x17),
                Call::SetPalette,
                Call::ClearScreen,
                Call::DefaultFont,
                Call::Refresh
            ]
        );
    }

    #[test]
    fn unknown_letter_is_dropped() {
        let (mut emu, mut rec) = setup();
        emu.feed_bytes(&mut rec, b"\x1bqx");
        assert_eq!(rec.calls, vec![Call::Write(b'x')]);
        assert!(emu.is_idle());
    }
}
