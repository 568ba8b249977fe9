//! In-memory VGA text screen implementing [`DisplaySurface`].
//!
//! The screen owns a grid of `(char, attr)` cells, a cursor, a text window,
//! the active font and palette, and the scrollback log. Rows that scroll off
//! the top of a full-width window are appended to the scrollback as raw
//! `char, attr` byte pairs, one full screen row per line.
//!
//! Cursor coordinates handed across [`DisplaySurface`] are 1-based and
//! window-relative; everything stored here is 0-based and absolute.

use std::fmt;

use crate::attr::TextAttr;
use crate::font::{Font, FontError};
use crate::palette::Palette;
use crate::ring::RingBufferError;
use crate::scrollback::{DEFAULT_MAX_BYTES, DEFAULT_MAX_LINES, ScrollbackLog};
use crate::surface::DisplaySurface;

/// Default screen width.
pub const DEFAULT_COLS: u16 = 80;
/// Default screen height.
pub const DEFAULT_ROWS: u16 = 25;

/// Configuration for [`Screen`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenConfig {
    pub cols: u16,
    pub rows: u16,
    /// Scrollback byte budget (two bytes per cell).
    pub scrollback_bytes: usize,
    /// Maximum scrollback lines retained.
    pub scrollback_lines: usize,
    /// Font installed at start and restored by the default-font commands.
    pub font: Font,
    pub palette: Palette,
    /// Bright backgrounds instead of blink.
    pub ice_color: bool,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            scrollback_bytes: DEFAULT_MAX_BYTES,
            scrollback_lines: DEFAULT_MAX_LINES,
            font: Font::default(),
            palette: Palette::default(),
            ice_color: false,
        }
    }
}

/// Errors from [`Screen::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenError {
    /// Zero columns or rows.
    EmptyGrid { cols: u16, rows: u16 },
    /// The scrollback storage could not be created.
    Scrollback(RingBufferError),
}

impl fmt::Display for ScreenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { cols, rows } => write!(f, "screen size {cols}x{rows} is empty"),
            Self::Scrollback(err) => write!(f, "cannot create scrollback: {err}"),
        }
    }
}

impl std::error::Error for ScreenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scrollback(err) => Some(err),
            Self::EmptyGrid { .. } => None,
        }
    }
}

impl From<RingBufferError> for ScreenError {
    fn from(err: RingBufferError) -> Self {
        Self::Scrollback(err)
    }
}

/// One character cell. The default cell is NUL with attribute 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCell {
    pub ch: u8,
    pub attr: TextAttr,
}

impl Default for CharCell {
    fn default() -> Self {
        Self::blank(TextAttr(0))
    }
}

impl CharCell {
    /// An empty cell: NUL drawn in `attr`.
    #[must_use]
    pub const fn blank(attr: TextAttr) -> Self {
        Self { ch: 0, attr }
    }
}

/// Text window in absolute 1-based screen coordinates, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub left: u16,
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
}

impl Window {
    /// The whole screen.
    #[must_use]
    pub const fn full(cols: u16, rows: u16) -> Self {
        Self {
            left: 1,
            top: 1,
            right: cols,
            bottom: rows,
        }
    }

    #[inline]
    #[must_use]
    pub const fn cols(&self) -> u16 {
        self.right - self.left + 1
    }

    #[inline]
    #[must_use]
    pub const fn rows(&self) -> u16 {
        self.bottom - self.top + 1
    }
}

/// Reference display surface.
#[derive(Debug, Clone)]
pub struct Screen {
    cols: u16,
    rows: u16,
    cells: Vec<CharCell>,
    /// Cursor column, 0-based absolute.
    cx: u16,
    /// Cursor row, 0-based absolute.
    cy: u16,
    attr: TextAttr,
    window: Window,
    cursor_visible: bool,
    ice_color: bool,
    palette: Palette,
    font: Font,
    default_font: Font,
    scrollback: ScrollbackLog,
    /// History lines shown above the live grid; 0 shows the live screen.
    scroll_line: usize,
    refresh_count: u64,
}

impl Screen {
    /// Create a cleared screen with the cursor at the top-left corner.
    pub fn new(config: ScreenConfig) -> Result<Self, ScreenError> {
        let ScreenConfig {
            cols,
            rows,
            scrollback_bytes,
            scrollback_lines,
            font,
            palette,
            ice_color,
        } = config;
        if cols == 0 || rows == 0 {
            return Err(ScreenError::EmptyGrid { cols, rows });
        }
        let scrollback = ScrollbackLog::new(scrollback_bytes, scrollback_lines)?;
        Ok(Self {
            cols,
            rows,
            cells: vec![CharCell::default(); usize::from(cols) * usize::from(rows)],
            cx: 0,
            cy: 0,
            attr: TextAttr::DEFAULT,
            window: Window::full(cols, rows),
            cursor_visible: true,
            ice_color,
            palette,
            default_font: font.clone(),
            font,
            scrollback,
            scroll_line: 0,
            refresh_count: 0,
        })
    }

    // ── Inspection ──────────────────────────────────────────────────

    /// Cell at a 0-based absolute position.
    #[must_use]
    pub fn cell(&self, row: u16, col: u16) -> Option<CharCell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.cells[self.index(row, col)])
    }

    /// Characters of one absolute row, NUL shown as space, trailing blanks
    /// trimmed.
    #[must_use]
    pub fn row_text(&self, row: u16) -> String {
        if row >= self.rows {
            return String::new();
        }
        let start = self.index(row, 0);
        let text: String = self.cells[start..start + usize::from(self.cols)]
            .iter()
            .map(|cell| if cell.ch == 0 { ' ' } else { char::from(cell.ch) })
            .collect();
        text.trim_end().to_owned()
    }

    /// Every row joined with `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        (0..self.rows)
            .map(|row| self.row_text(row))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Cursor as 0-based absolute `(row, col)`.
    #[must_use]
    pub fn cursor_position(&self) -> (u16, u16) {
        (self.cy, self.cx)
    }

    #[must_use]
    pub fn scrollback(&self) -> &ScrollbackLog {
        &self.scrollback
    }

    #[must_use]
    pub fn window(&self) -> Window {
        self.window
    }

    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    #[must_use]
    pub fn ice_color(&self) -> bool {
        self.ice_color
    }

    #[must_use]
    pub fn font(&self) -> &Font {
        &self.font
    }

    /// Number of repaint requests seen so far.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    // ── Scrollback view ─────────────────────────────────────────────

    /// Scroll the view back so `line` history lines sit above the live
    /// grid, which shifts down by as many rows. `0` returns to the live
    /// screen. `line` is clamped to the stored line count.
    pub fn set_scroll(&mut self, line: usize) {
        let line = line.min(self.scrollback.line_count());
        if line == self.scroll_line {
            return;
        }
        tracing::trace!(line, "scrollback view moved");
        self.scroll_line = line;
        self.refresh_count += 1;
    }

    /// History lines currently shown above the live grid.
    #[inline]
    #[must_use]
    pub fn scroll_line(&self) -> usize {
        self.scroll_line
    }

    /// Row `row` (0-based) of the composed view: history rows first, newest
    /// directly above the live grid, then the top of the live grid.
    ///
    /// History rows are rebuilt from their stored `(char, attr)` pairs and
    /// cut or padded with blank cells to the screen width. Rows whose
    /// history line is gone come back blank.
    #[must_use]
    pub fn view_row(&self, row: u16) -> Option<Vec<CharCell>> {
        if row >= self.rows {
            return None;
        }
        let cols = usize::from(self.cols);
        let line = self.scroll_line;
        let row_index = usize::from(row);
        if row_index >= line {
            let live = u16::try_from(row_index - line).ok()?;
            let start = self.index(live, 0);
            return Some(self.cells[start..start + cols].to_vec());
        }
        let mut cells = vec![CharCell::default(); cols];
        if let Some(view) = self.scrollback.get_line(line - 1 - row_index) {
            let bytes = view.to_vec();
            for (cell, pair) in cells.iter_mut().zip(bytes.chunks_exact(2)) {
                *cell = CharCell {
                    ch: pair[0],
                    attr: TextAttr(pair[1]),
                };
            }
        }
        Some(cells)
    }

    /// Characters of one composed view row, formatted like
    /// [`row_text`](Self::row_text).
    #[must_use]
    pub fn view_row_text(&self, row: u16) -> String {
        self.view_row(row)
            .map(|cells| {
                let text: String = cells
                    .iter()
                    .map(|cell| if cell.ch == 0 { ' ' } else { char::from(cell.ch) })
                    .collect();
                text.trim_end().to_owned()
            })
            .unwrap_or_default()
    }

    // ── Internals ───────────────────────────────────────────────────

    fn index(&self, row: u16, col: u16) -> usize {
        usize::from(row) * usize::from(self.cols) + usize::from(col)
    }

    fn is_full_width(&self) -> bool {
        self.window.left == 1 && self.window.right == self.cols
    }

    fn is_full_screen(&self) -> bool {
        self.window == Window::full(self.cols, self.rows)
    }

    /// Append `count` absolute rows starting at `first` to the scrollback.
    fn push_rows(&mut self, first: u16, count: u16) {
        let mut line = Vec::with_capacity(usize::from(self.cols) * 2);
        for row in first..first.saturating_add(count).min(self.rows) {
            line.clear();
            let start = self.index(row, 0);
            for cell in &self.cells[start..start + usize::from(self.cols)] {
                line.push(cell.ch);
                line.push(cell.attr.bits());
            }
            self.scrollback.add_line(&line);
        }
    }

    /// Fill the window columns of absolute rows `rows` with `cell`.
    fn fill_rows(&mut self, rows: std::ops::Range<u16>, cell: CharCell) {
        let left = self.window.left - 1;
        let right = self.window.right;
        for row in rows {
            let start = self.index(row, left);
            let end = self.index(row, right);
            self.cells[start..end].fill(cell);
        }
    }

    /// Copy the window columns of absolute row `from` onto row `to`.
    fn copy_row(&mut self, from: u16, to: u16) {
        let left = self.window.left - 1;
        let width = usize::from(self.window.cols());
        let src = self.index(from, left);
        let dst = self.index(to, left);
        self.cells.copy_within(src..src + width, dst);
    }

    /// Resolve a window-relative top row and line count to an absolute
    /// `(first, last, lines)` scroll region, or `None` if nothing moves.
    fn scroll_region(&self, top: u16, lines: u16) -> Option<(u16, u16, u16)> {
        let top = top.clamp(1, self.window.rows());
        let first = self.window.top - 1 + top - 1;
        let last = self.window.bottom - 1;
        let lines = lines.min(last - first + 1);
        (lines > 0).then_some((first, last, lines))
    }
}

impl DisplaySurface for Screen {
    fn cursor_x(&self) -> u16 {
        self.cx + 2 - self.window.left
    }

    fn cursor_y(&self) -> u16 {
        self.cy + 2 - self.window.top
    }

    fn cols(&self) -> u16 {
        self.window.cols()
    }

    fn rows(&self) -> u16 {
        self.window.rows()
    }

    fn screen_cols(&self) -> u16 {
        self.cols
    }

    fn screen_rows(&self) -> u16 {
        self.rows
    }

    fn goto_xy(&mut self, x: u16, y: u16) {
        let x = x.clamp(1, self.window.cols());
        let y = y.clamp(1, self.window.rows());
        self.cx = x + self.window.left - 2;
        self.cy = y + self.window.top - 2;
    }

    fn write_char(&mut self, c: u8) {
        let mut x = self.cursor_x();
        let mut y = self.cursor_y();
        match c {
            b'\n' => {
                x = 1;
                y += 1;
            }
            b'\r' => x = 1,
            0x07 => return,
            0x08 => x = x.saturating_sub(1).max(1),
            _ => {
                let at = self.index(self.cy, self.cx);
                self.cells[at] = CharCell {
                    ch: c,
                    attr: self.attr,
                };
                if self.cx + 1 == self.window.right {
                    x = 1;
                    y += 1;
                } else {
                    x += 1;
                }
            }
        }
        if y > self.window.rows() {
            self.scroll_up(1, 1);
            self.goto_xy(1, self.window.rows());
        } else {
            self.goto_xy(x, y);
        }
    }

    fn clear_screen(&mut self) {
        if self.is_full_screen() {
            self.push_rows(0, self.rows);
        }
        let blank = CharCell::blank(self.attr.blank());
        self.fill_rows(self.window.top - 1..self.window.bottom, blank);
        self.goto_xy(1, 1);
    }

    fn clear_to_eol(&mut self) {
        let start = self.index(self.cy, self.cx);
        let end = self.index(self.cy, self.window.right);
        let blank = CharCell::blank(self.attr.blank());
        self.cells[start..end].fill(blank);
    }

    fn clear_above(&mut self) {
        self.fill_rows(self.window.top - 1..self.cy + 1, CharCell::default());
    }

    fn clear_below(&mut self) {
        self.fill_rows(self.cy..self.window.bottom, CharCell::default());
    }

    fn scroll_up(&mut self, top: u16, lines: u16) {
        let Some((first, last, lines)) = self.scroll_region(top, lines) else {
            return;
        };
        if self.is_full_width() {
            self.push_rows(first, lines);
        }
        for row in first..last + 1 - lines {
            self.copy_row(row + lines, row);
        }
        let blank = CharCell::blank(self.attr.blank());
        self.fill_rows(last + 1 - lines..last + 1, blank);
    }

    fn scroll_down(&mut self, top: u16, lines: u16) {
        let Some((first, last, lines)) = self.scroll_region(top, lines) else {
            return;
        };
        for row in (first + lines..=last).rev() {
            self.copy_row(row - lines, row);
        }
        let blank = CharCell::blank(self.attr.blank());
        self.fill_rows(first..first + lines, blank);
    }

    fn set_attribute(&mut self, attr: TextAttr) {
        self.attr = attr;
    }

    fn attribute(&self) -> TextAttr {
        self.attr
    }

    fn set_window(&mut self, x1: u16, y1: u16, x2: u16, y2: u16) {
        let x2 = x2.min(self.cols);
        let y2 = y2.min(self.rows);
        if x1 == 0 || y1 == 0 || x1 > x2 || y1 > y2 {
            tracing::trace!(x1, y1, x2, y2, "ignored invalid window");
            return;
        }
        self.window = Window {
            left: x1,
            top: y1,
            right: x2,
            bottom: y2,
        };
        self.goto_xy(1, 1);
    }

    fn cursor_show(&mut self) {
        self.cursor_visible = true;
    }

    fn cursor_hide(&mut self) {
        self.cursor_visible = false;
    }

    fn load_font(&mut self, data: &[u8], width: u8, height: u8) -> Result<(), FontError> {
        self.font = Font::load(data, width, height)?;
        Ok(())
    }

    fn patch_font_range(&mut self, data: &[u8], start: u8, count: usize) -> Result<(), FontError> {
        self.font.patch_range(data, start, count)
    }

    fn load_default_font(&mut self) {
        self.font.clone_from(&self.default_font);
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }

    fn set_palette(&mut self, palette: &Palette) {
        self.palette.clone_from(palette);
    }

    fn set_ice_color(&mut self, enabled: bool) {
        self.ice_color = enabled;
    }

    fn refresh(&mut self) {
        self.refresh_count += 1;
    }
}
