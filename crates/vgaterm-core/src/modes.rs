//! Dialect enable flags.
//!
//! VT100 is exclusive: when it is on, the other dialects are not consulted
//! at all. Otherwise ANSI, TextFX and Avatar share the byte stream and each
//! one only claims its own lead bytes.

use bitflags::bitflags;

bitflags! {
    /// Which escape dialects the emulator interprets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Dialects: u8 {
        /// VT100 (exclusive of every other dialect).
        const VT100 = 1 << 0;
        /// ANSI / ECMA-48 CSI subset.
        const ANSI = 1 << 1;
        /// Avatar/0 (`0x16`-prefixed commands).
        const AVATAR = 1 << 2;
        /// TextFX (`ESC` + command letter + raw parameter bytes).
        const TEXTFX = 1 << 3;
    }
}

impl Default for Dialects {
    /// The BBS mix: ANSI, Avatar and TextFX on, VT100 off.
    fn default() -> Self {
        Self::ANSI | Self::AVATAR | Self::TEXTFX
    }
}

impl Dialects {
    /// Whether VT100 mode is active (which disables everything else).
    #[inline]
    #[must_use]
    pub fn vt100(self) -> bool {
        self.contains(Self::VT100)
    }

    #[inline]
    #[must_use]
    pub fn ansi(self) -> bool {
        !self.vt100() && self.contains(Self::ANSI)
    }

    #[inline]
    #[must_use]
    pub fn avatar(self) -> bool {
        !self.vt100() && self.contains(Self::AVATAR)
    }

    #[inline]
    #[must_use]
    pub fn textfx(self) -> bool {
        !self.vt100() && self.contains(Self::TEXTFX)
    }

    /// Whether `ESC` starts a sequence outside VT100 mode.
    #[inline]
    #[must_use]
    pub fn claims_escape(self) -> bool {
        self.ansi() || self.textfx()
    }
}
