#![forbid(unsafe_code)]

//! VGA text-mode terminal emulation.
//!
//! The [`Emulator`] turns a byte stream in any mix of plain control codes,
//! ANSI, VT100, Avatar/0 and TextFX into calls on a [`DisplaySurface`]. It
//! holds no display state itself; [`Screen`] is the in-memory surface shipped
//! here, and [`Terminal`] pairs the two for a session.
//!
//! [`RingBuffer`] and [`ScrollbackLog`] keep bounded line history in fixed
//! memory.

pub mod attr;
pub mod emulator;
pub mod font;
pub mod modes;
pub mod palette;
pub mod params;
pub mod reply;
pub mod ring;
pub mod screen;
pub mod scrollback;
pub mod surface;
pub mod terminal;
pub mod textfx;

mod ansi;
mod avatar;
mod vt100;

pub use attr::{ANSI_TO_VGA, TextAttr, VtAttr};
pub use emulator::{Emulator, EmulatorConfig, Stage};
pub use font::{Font, FontError};
pub use modes::Dialects;
pub use palette::{Palette, PaletteError, Rgb, StockPalette};
pub use reply::{ReplyContext, ReplyEngine, ReplyQueue, TerminalQuery};
pub use ring::{RingBuffer, RingBufferError};
pub use screen::{CharCell, Screen, ScreenConfig, ScreenError, Window};
pub use scrollback::{LineRecord, LineView, ScrollbackLog};
pub use surface::DisplaySurface;
pub use terminal::{Terminal, TerminalConfig};
