//! A terminal session: one [`Emulator`] driving one [`Screen`].
//!
//! This is the owning boundary most hosts want. It keeps the emulation
//! state and the display state together and exposes:
//! - feeding bytes received from the remote side,
//! - draining replies to send back,
//! - read access to the screen and its scrollback.

use crate::emulator::{Emulator, EmulatorConfig};
use crate::modes::Dialects;
use crate::screen::{Screen, ScreenConfig, ScreenError};
use crate::surface::DisplaySurface;

/// Configuration for [`Terminal`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TerminalConfig {
    pub screen: ScreenConfig,
    pub emulator: EmulatorConfig,
}

/// Emulator and screen for one session.
#[derive(Debug, Clone)]
pub struct Terminal {
    emulator: Emulator,
    screen: Screen,
}

impl Terminal {
    /// Create an 80x25 terminal with default configuration.
    pub fn new() -> Result<Self, ScreenError> {
        Self::with_config(TerminalConfig::default())
    }

    /// Create a terminal with explicit configuration.
    pub fn with_config(config: TerminalConfig) -> Result<Self, ScreenError> {
        let screen = Screen::new(config.screen)?;
        tracing::debug!(
            cols = screen.screen_cols(),
            rows = screen.screen_rows(),
            dialects = ?config.emulator.dialects,
            "terminal created"
        );
        Ok(Self {
            emulator: Emulator::with_config(config.emulator),
            screen,
        })
    }

    /// Feed bytes received from the remote side.
    pub fn feed_bytes(&mut self, bytes: &[u8]) {
        self.emulator.feed_bytes(&mut self.screen, bytes);
    }

    /// Drain queued replies in FIFO order.
    pub fn drain_replies(&mut self) -> Vec<Vec<u8>> {
        self.emulator.drain_replies()
    }

    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Mutable screen access, for host-side writes such as local echo.
    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    #[must_use]
    pub fn emulator(&self) -> &Emulator {
        &self.emulator
    }

    /// Switch dialects, abandoning any sequence in progress.
    pub fn set_dialects(&mut self, dialects: Dialects) {
        self.emulator.set_dialects(dialects);
    }

    /// Reset the emulation state. The screen contents are kept.
    pub fn reset(&mut self) {
        self.emulator.reset();
    }
}
