//! Byte-stream emulator multiplexing the terminal dialects.
//!
//! [`Emulator::feed`] consumes one byte at a time and turns it into zero or
//! more [`DisplaySurface`] calls. There is no look-ahead: every multi-byte
//! sequence is tracked by explicit per-dialect state, so input may be split
//! anywhere.
//!
//! Dispatch order outside VT100 mode, per byte:
//!
//! 1. TextFX parameter collection
//! 2. Avatar repeat collection
//! 3. pending escape / ANSI CSI accumulation
//! 4. TextFX command byte or Avatar command continuation
//! 5. ground: control bytes and literal characters
//!
//! With [`Dialects::VT100`] set, every byte goes to the VT100 machine
//! instead. Malformed or unknown sequences are dropped silently; bytes that
//! were part of a sequence are never echoed.

use crate::ansi::{Ansi, EscapeOutcome};
use crate::attr::TextAttr;
use crate::avatar::Avatar;
use crate::modes::Dialects;
use crate::reply::{ReplyEngine, ReplyQueue};
use crate::surface::DisplaySurface;
use crate::textfx::TextFx;
use crate::vt100::Vt100;

/// Avatar command prefix.
pub const AVATAR_LEAD: u8 = 0x16;
/// Avatar repeat-run command.
pub const AVATAR_REPEAT: u8 = 0x19;
/// Escape.
pub const ESC: u8 = 0x1b;

/// Progress through a command with raw parameter bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Not in a command.
    #[default]
    Idle,
    /// Lead byte seen, command byte next.
    AwaitingCommand,
    /// Collecting `need` parameter bytes for `command`.
    CollectingParams {
        command: u8,
        have: usize,
        need: usize,
    },
}

impl Stage {
    #[inline]
    #[must_use]
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }
}

/// Configuration for [`Emulator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// Dialects interpreted from the start.
    pub dialects: Dialects,
    /// Interpret `0x19 <char> <count>` as an Avatar repeat. Off by default
    /// because BBS content commonly sends 0x19 as a literal arrow glyph.
    pub avatar_repeat: bool,
    /// Initial TextFX default attribute (`j`, `k`, `Z`).
    pub default_attr: TextAttr,
    /// Identity used for host replies.
    pub reply_engine: ReplyEngine,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            dialects: Dialects::default(),
            avatar_repeat: false,
            default_attr: TextAttr::DEFAULT,
            reply_engine: ReplyEngine::default(),
        }
    }
}

/// Per-session emulation state. Holds no display state of its own.
#[derive(Debug, Clone)]
pub struct Emulator {
    config: EmulatorConfig,
    dialects: Dialects,
    vt: Vt100,
    ansi: Ansi,
    textfx: TextFx,
    avatar: Avatar,
    replies: ReplyQueue,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator {
    /// Create an emulator with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EmulatorConfig::default())
    }

    /// Create an emulator with explicit configuration.
    #[must_use]
    pub fn with_config(config: EmulatorConfig) -> Self {
        Self {
            dialects: config.dialects,
            vt: Vt100::default(),
            ansi: Ansi::default(),
            textfx: TextFx::new(config.default_attr),
            avatar: Avatar::default(),
            replies: ReplyQueue::new(config.reply_engine.clone()),
            config,
        }
    }

    /// Feed one byte.
    pub fn feed<S: DisplaySurface + ?Sized>(&mut self, surface: &mut S, b: u8) {
        if self.dialects.vt100() {
            self.vt.feed(surface, b);
            return;
        }

        if self.textfx.is_collecting() {
            self.textfx.feed(surface, b, &mut self.replies);
        } else if self.avatar.is_repeating() {
            self.avatar.feed(surface, b);
        } else if self.ansi.is_active() {
            if self.ansi.feed(surface, b, &mut self.replies) == EscapeOutcome::NotCsi {
                if self.dialects.textfx() {
                    self.textfx.command(surface, b, &mut self.replies);
                } else {
                    tracing::trace!(byte = b, "escape aborted");
                }
            }
        } else if self.textfx.is_awaiting_command() {
            self.textfx.command(surface, b, &mut self.replies);
        } else if self.avatar.is_active() {
            self.avatar.feed(surface, b);
        } else {
            self.ground(surface, b);
        }
    }

    /// Feed a chunk of bytes.
    pub fn feed_bytes<S: DisplaySurface + ?Sized>(&mut self, surface: &mut S, bytes: &[u8]) {
        for &b in bytes {
            self.feed(surface, b);
        }
    }

    fn ground<S: DisplaySurface + ?Sized>(&mut self, surface: &mut S, b: u8) {
        match b {
            AVATAR_LEAD if self.dialects.avatar() => self.avatar.begin(),
            AVATAR_REPEAT if self.dialects.avatar() && self.config.avatar_repeat => {
                self.avatar.begin_repeat();
            }
            ESC if self.dialects.claims_escape() => {
                if self.dialects.ansi() {
                    self.ansi.begin();
                } else {
                    self.textfx.await_command();
                }
            }
            0x09 => tab(surface),
            0x0c => surface.clear_screen(),
            _ => surface.write_char(b),
        }
    }

    /// Drain queued host replies in FIFO order.
    pub fn drain_replies(&mut self) -> Vec<Vec<u8>> {
        self.replies.drain()
    }

    /// Whether no sequence is in progress in any dialect.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.vt.is_idle() && !self.ansi.is_active() && self.textfx.is_idle() && self.avatar.is_idle()
    }

    /// Current TextFX stage.
    #[must_use]
    pub fn textfx_stage(&self) -> Stage {
        self.textfx.stage()
    }

    /// Current Avatar stage.
    #[must_use]
    pub fn avatar_stage(&self) -> Stage {
        self.avatar.stage()
    }

    /// Enabled dialects.
    #[inline]
    #[must_use]
    pub fn dialects(&self) -> Dialects {
        self.dialects
    }

    /// Change the enabled dialects, abandoning any sequence in progress.
    pub fn set_dialects(&mut self, dialects: Dialects) {
        if dialects != self.dialects {
            tracing::debug!(?dialects, "dialects changed");
        }
        self.dialects = dialects;
        self.vt.abort();
        self.ansi.abort();
        self.textfx.abort();
        self.avatar.abort();
    }

    /// Whether the Avatar repeat command is interpreted.
    #[must_use]
    pub fn avatar_repeat(&self) -> bool {
        self.config.avatar_repeat
    }

    pub fn set_avatar_repeat(&mut self, enabled: bool) {
        self.config.avatar_repeat = enabled;
    }

    /// Return to power-on state: configured dialects, no saved positions,
    /// default user palettes, no pending replies.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config.clone());
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }
}

/// Move to the next 8-column tab stop, stopping at the right window edge.
pub(crate) fn tab<S: DisplaySurface + ?Sized>(surface: &mut S) {
    let cols = surface.cols();
    let mut x = surface.cursor_x().saturating_add(1);
    if x > cols {
        x = cols;
    } else {
        while x < cols && (x - 1) % 8 != 0 {
            x += 1;
        }
    }
    surface.goto_xy(x, surface.cursor_y());
}

/// Move relative to the cursor; the surface clamps the result.
pub(crate) fn move_by<S: DisplaySurface + ?Sized>(surface: &mut S, dx: i32, dy: i32) {
    let x = offset(surface.cursor_x(), dx);
    let y = offset(surface.cursor_y(), dy);
    surface.goto_xy(x, y);
}

fn offset(base: u16, delta: i32) -> u16 {
    (i32::from(base) + delta).clamp(0, i32::from(u16::MAX)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::{Call, Recorder};

    fn run(emu: &mut Emulator, bytes: &[u8]) -> Recorder {
        let mut rec = Recorder::new(80, 25);
        emu.feed_bytes(&mut rec, bytes);
        rec
    }

    #[test]
    fn plain_text_is_written() {
        let mut emu = Emulator::new();
        let rec = run(&mut emu, b"hi\r\n");
        assert_eq!(rec.written(), b"hi\r\n");
        assert!(emu.is_idle());
    }

    #[test]
    fn tab_stops_every_eight_columns() {
        let mut emu = Emulator::new();
        let mut rec = Recorder::new(80, 25);
        emu.feed(&mut rec, b'\t');
        assert_eq!(rec.x, 9);
        emu.feed(&mut rec, b'\t');
        assert_eq!(rec.x, 17);
        rec.x = 78;
        emu.feed(&mut rec, b'\t');
        assert_eq!(rec.x, 80);
        emu.feed(&mut rec, b'\t');
        assert_eq!(rec.x, 80);
    }

    #[test]
    fn form_feed_clears() {
        let mut emu = Emulator::new();
        let rec = run(&mut emu, b"\x0c");
        assert_eq!(rec.calls, vec![Call::ClearScreen]);
    }

    #[test]
    fn escape_is_literal_without_ansi_or_textfx() {
        let mut emu = Emulator::with_config(EmulatorConfig {
            dialects: Dialects::AVATAR,
            ..EmulatorConfig::default()
        });
        let rec = run(&mut emu, b"\x1b[2J");
        assert_eq!(rec.written(), b"\x1b[2J");
    }

    #[test]
    fn escape_without_ansi_goes_straight_to_textfx() {
        let mut emu = Emulator::with_config(EmulatorConfig {
            dialects: Dialects::TEXTFX,
            ..EmulatorConfig::default()
        });
        let mut rec = Recorder::new(80, 25);
        emu.feed(&mut rec, ESC);
        assert_eq!(emu.textfx_stage(), Stage::AwaitingCommand);
        emu.feed(&mut rec, b'J');
        assert_eq!(rec.calls, vec![Call::ClearScreen]);
        assert!(emu.is_idle());
    }

    #[test]
    fn non_csi_escape_aborts_without_textfx() {
        let mut emu = Emulator::with_config(EmulatorConfig {
            dialects: Dialects::ANSI,
            ..EmulatorConfig::default()
        });
        let rec = run(&mut emu, b"\x1bJx");
        assert_eq!(rec.written(), b"x");
        assert!(emu.is_idle());
    }

    #[test]
    fn vt100_mode_is_exclusive() {
        let mut emu = Emulator::with_config(EmulatorConfig {
            dialects: Dialects::all(),
            ..EmulatorConfig::default()
        });
        // 0x16 toggles reverse video in VT100 instead of starting Avatar.
        let rec = run(&mut emu, b"\x16A");
        assert_eq!(rec.calls, vec![Call::SetAttr(0x10), Call::Write(b'A')]);
    }

    #[test]
    fn set_dialects_abandons_sequences() {
        let mut emu = Emulator::new();
        let mut rec = Recorder::new(80, 25);
        emu.feed_bytes(&mut rec, b"\x1b[1");
        assert!(!emu.is_idle());
        emu.set_dialects(Dialects::ANSI);
        assert!(emu.is_idle());
        emu.feed(&mut rec, b'm');
        assert_eq!(rec.written(), b"m");
    }

    #[test]
    fn reset_restores_configured_state() {
        let mut emu = Emulator::new();
        let mut rec = Recorder::new(80, 25);
        emu.feed_bytes(&mut rec, b"\x1b[6n\x16");
        emu.set_dialects(Dialects::VT100);
        emu.reset();
        assert!(emu.is_idle());
        assert_eq!(emu.dialects(), Dialects::default());
        assert!(emu.drain_replies().is_empty());
    }

    #[test]
    fn avatar_repeat_toggles_at_runtime() {
        let mut emu = Emulator::new();
        assert!(!emu.avatar_repeat());
        let rec = run(&mut emu, b"\x19x\x03");
        assert_eq!(rec.written(), b"\x19x\x03");

        emu.set_avatar_repeat(true);
        assert!(emu.avatar_repeat());
        let rec = run(&mut emu, b"\x19x\x03");
        assert_eq!(rec.written(), b"xxx");

        emu.reset();
        assert!(emu.avatar_repeat(), "reset keeps the runtime setting");
        emu.set_avatar_repeat(false);
        let rec = run(&mut emu, b"\x19");
        assert_eq!(rec.written(), b"\x19");
        assert!(emu.is_idle());
    }

    #[test]
    fn relative_moves_floor_at_zero() {
        let mut rec = Recorder::new(80, 25);
        move_by(&mut rec, -5, -5);
        assert_eq!(rec.calls, vec![Call::Goto(0, 0)]);
        assert_eq!((rec.x, rec.y), (1, 1));
    }
}
