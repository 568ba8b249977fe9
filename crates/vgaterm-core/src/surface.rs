//! The display capability the emulator drives.
//!
//! Coordinates are 1-based and relative to the active window, the way the
//! classic text-mode `gotoxy`/`wherex` API works. Implementations clamp
//! out-of-range positions instead of failing; the emulator never checks.

use crate::attr::TextAttr;
use crate::font::FontError;
use crate::palette::Palette;

/// A character-grid display with cursor, attribute, window, font and
/// palette state.
pub trait DisplaySurface {
    /// Cursor column within the window (1-based).
    fn cursor_x(&self) -> u16;
    /// Cursor row within the window (1-based).
    fn cursor_y(&self) -> u16;
    /// Width of the active window.
    fn cols(&self) -> u16;
    /// Height of the active window.
    fn rows(&self) -> u16;
    /// Width of the whole screen.
    fn screen_cols(&self) -> u16;
    /// Height of the whole screen.
    fn screen_rows(&self) -> u16;

    /// Move the cursor, clamping to the window.
    fn goto_xy(&mut self, x: u16, y: u16);
    /// Write one byte: controls (CR, LF, BS, BEL) move the cursor, anything
    /// else is drawn with the current attribute.
    fn write_char(&mut self, c: u8);

    fn clear_screen(&mut self);
    fn clear_to_eol(&mut self);
    /// Clear from the window top through the cursor row.
    fn clear_above(&mut self);
    /// Clear from the cursor row through the window bottom.
    fn clear_below(&mut self);
    /// Scroll the window rows from `top` (window-relative) up by `lines`.
    fn scroll_up(&mut self, top: u16, lines: u16);
    /// Scroll the window rows from `top` (window-relative) down by `lines`.
    fn scroll_down(&mut self, top: u16, lines: u16);

    fn set_attribute(&mut self, attr: TextAttr);
    fn attribute(&self) -> TextAttr;

    /// Set the foreground; values above 15 also set the blink bit.
    fn set_foreground(&mut self, color: u8) {
        let fg = if color > 15 { (color & 0x0F) | 0x80 } else { color };
        let attr = self.attribute().bits();
        self.set_attribute(TextAttr((attr & 0x70) | fg));
    }

    /// Set the background (0..=7, masked).
    fn set_background(&mut self, color: u8) {
        let attr = self.attribute();
        self.set_attribute(attr.with_bg(color & 0x07));
    }

    /// Set the active window in absolute 1-based screen coordinates and home
    /// the cursor.
    fn set_window(&mut self, x1: u16, y1: u16, x2: u16, y2: u16);

    fn cursor_show(&mut self);
    fn cursor_hide(&mut self);

    /// Replace the font with 256 glyphs of `width` x `height`.
    fn load_font(&mut self, data: &[u8], width: u8, height: u8) -> Result<(), FontError>;
    /// Replace `count` glyphs starting at `start`.
    fn patch_font_range(&mut self, data: &[u8], start: u8, count: usize)
    -> Result<(), FontError>;
    /// Restore the built-in font.
    fn load_default_font(&mut self);

    fn palette(&self) -> &Palette;
    fn set_palette(&mut self, palette: &Palette);

    /// Toggle bright backgrounds in place of blinking.
    fn set_ice_color(&mut self, enabled: bool);

    /// Repaint after palette or font changes.
    fn refresh(&mut self);
}
