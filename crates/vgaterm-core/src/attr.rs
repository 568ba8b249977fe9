//! Text attributes: the VGA attribute byte and the VT100 rendition mask.
//!
//! A VGA text cell carries one attribute byte:
//!
//! ```text
//!   7   6 5 4   3 2 1 0
//! blink  bg      fg
//! ```
//!
//! Bit 3 is the "bright" foreground bit. In ICE-color mode bit 7 selects a
//! bright background instead of blinking.
//!
//! VT100 renditions (bold, underline, reverse, ...) have no direct
//! equivalent on a color text display, so [`VtAttr`] tracks them as flags and
//! [`VtAttr::to_text_attr`] folds them into colors through a fixed table.

use bitflags::bitflags;

/// Map from ANSI color order (black, red, green, yellow, blue, magenta, cyan,
/// white) to VGA color numbers.
pub const ANSI_TO_VGA: [u8; 8] = [0, 4, 2, 6, 1, 5, 3, 7];

/// VGA color numbers.
pub mod color {
    pub const BLACK: u8 = 0;
    pub const BLUE: u8 = 1;
    pub const GREEN: u8 = 2;
    pub const CYAN: u8 = 3;
    pub const RED: u8 = 4;
    pub const MAGENTA: u8 = 5;
    pub const BROWN: u8 = 6;
    pub const GREY: u8 = 7;
    pub const DARK_GREY: u8 = 8;
    pub const LIGHT_BLUE: u8 = 9;
    pub const LIGHT_CYAN: u8 = 11;
    pub const WHITE: u8 = 15;
}

/// A VGA text attribute byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextAttr(pub u8);

impl Default for TextAttr {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TextAttr {
    /// Light grey on black, the power-on attribute.
    pub const DEFAULT: Self = Self(0x07);

    /// Build from foreground and background color numbers.
    #[must_use]
    pub const fn new(fg: u8, bg: u8) -> Self {
        Self((bg << 4) | fg)
    }

    /// Raw byte value.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Foreground color including the bright bit (0..=15).
    #[inline]
    #[must_use]
    pub const fn fg(self) -> u8 {
        self.0 & 0x0F
    }

    /// Background color (0..=7).
    #[inline]
    #[must_use]
    pub const fn bg(self) -> u8 {
        (self.0 & 0x70) >> 4
    }

    /// Whether the blink / bright-background bit is set.
    #[inline]
    #[must_use]
    pub const fn blink(self) -> bool {
        self.0 & 0x80 != 0
    }

    /// Set the bright foreground bit.
    #[inline]
    #[must_use]
    pub const fn bright(self) -> Self {
        Self(self.0 | 0x08)
    }

    /// Set the blink bit.
    #[inline]
    #[must_use]
    pub const fn with_blink(self) -> Self {
        Self(self.0 | 0x80)
    }

    /// Replace the low nibble with `fg`.
    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: u8) -> Self {
        Self((self.0 & 0xF0) | fg)
    }

    /// Replace the background field with `bg`.
    ///
    /// `bg` is not masked: values above 7 spill into the blink bit, which is
    /// how high-intensity backgrounds are expressed for ICE color.
    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: u8) -> Self {
        Self((self.0 & 0x8F) | (bg << 4))
    }

    /// Replace the three low color bits with `color`, keeping brightness.
    #[inline]
    #[must_use]
    pub const fn with_base_fg(self, color: u8) -> Self {
        Self((self.0 & 0xF8) + color)
    }

    /// Swap foreground and background nibbles as reverse video does.
    #[inline]
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self(((self.0 << 4) & 0x70) | (self.0 >> 4))
    }

    /// Attribute used to blank cells: background kept, everything else zero.
    #[inline]
    #[must_use]
    pub const fn blank(self) -> Self {
        Self(0).with_bg(self.bg())
    }
}

bitflags! {
    /// VT100 rendition flags accumulated by SGR and the toggle controls.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VtAttr: u8 {
        const BOLD      = 1 << 0;
        const LOWINT    = 1 << 1;
        const UNDERLINE = 1 << 2;
        const BLINK     = 1 << 3;
        const REVERSE   = 1 << 4;
        const INVISIBLE = 1 << 5;
    }
}

impl VtAttr {
    /// Fold the rendition flags into a color attribute.
    ///
    /// Reverse video paints the background; otherwise the foreground is
    /// chosen by underline+bold > bold > underline > plain. Blink is
    /// independent of both.
    #[must_use]
    pub fn to_text_attr(self) -> TextAttr {
        let mut attr = TextAttr(0);
        if self.contains(Self::BLINK) {
            attr = attr.with_blink();
        }
        let bold = self.contains(Self::BOLD);
        let underline = self.contains(Self::UNDERLINE);
        if self.contains(Self::REVERSE) {
            attr = attr.with_bg(color::BLUE);
            if underline && bold {
                attr = attr.with_bg(color::WHITE);
            } else if bold {
                attr = attr.with_bg(color::GREY);
            } else if underline {
                attr = attr.with_bg(color::LIGHT_BLUE);
            }
        } else {
            let fg = if underline && bold {
                color::LIGHT_CYAN
            } else if bold {
                color::WHITE
            } else if underline {
                color::DARK_GREY
            } else {
                color::GREY
            };
            attr = attr.with_fg(fg);
        }
        attr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_accessors() {
        let a = TextAttr(0x9E);
        assert_eq!(a.fg(), 0x0E);
        assert_eq!(a.bg(), 1);
        assert!(a.blink());
        assert_eq!(TextAttr::new(color::WHITE, color::BLUE), TextAttr(0x1F));
    }

    #[test]
    fn setters_match_vga_macros() {
        assert_eq!(TextAttr(0x07).bright(), TextAttr(0x0F));
        assert_eq!(TextAttr(0x07).with_blink(), TextAttr(0x87));
        assert_eq!(TextAttr(0x4F).with_fg(2), TextAttr(0x42));
        assert_eq!(TextAttr(0x8F).with_bg(3), TextAttr(0xBF));
        assert_eq!(TextAttr(0x0F).with_base_fg(4), TextAttr(0x0C));
        assert_eq!(TextAttr(0x00).with_bg(15), TextAttr(0xF0));
    }

    #[test]
    fn reverse_swaps_nibbles() {
        assert_eq!(TextAttr(0x17).reversed(), TextAttr(0x71));
        assert_eq!(TextAttr(0x0F).reversed(), TextAttr(0x70));
    }

    #[test]
    fn blank_keeps_background_only() {
        assert_eq!(TextAttr(0x9E).blank(), TextAttr(0x10));
    }

    #[test]
    fn precedence_table_non_reverse() {
        assert_eq!(VtAttr::empty().to_text_attr(), TextAttr(0x07));
        assert_eq!(VtAttr::BOLD.to_text_attr(), TextAttr(0x0F));
        assert_eq!(VtAttr::UNDERLINE.to_text_attr(), TextAttr(0x08));
        assert_eq!(
            (VtAttr::BOLD | VtAttr::UNDERLINE).to_text_attr(),
            TextAttr(0x0B)
        );
        assert_eq!(
            (VtAttr::BOLD | VtAttr::BLINK).to_text_attr(),
            TextAttr(0x8F)
        );
    }

    #[test]
    fn precedence_table_reverse() {
        assert_eq!(VtAttr::REVERSE.to_text_attr(), TextAttr(0x10));
        assert_eq!((VtAttr::REVERSE | VtAttr::BOLD).to_text_attr(), TextAttr(0x70));
        assert_eq!(
            (VtAttr::REVERSE | VtAttr::UNDERLINE).to_text_attr(),
            TextAttr(0x90)
        );
        assert_eq!(
            (VtAttr::REVERSE | VtAttr::UNDERLINE | VtAttr::BOLD).to_text_attr(),
            TextAttr(0xF0)
        );
    }

    #[test]
    fn lowint_and_invisible_do_not_change_colors() {
        assert_eq!(
            (VtAttr::LOWINT | VtAttr::INVISIBLE).to_text_attr(),
            TextAttr(0x07)
        );
    }
}
