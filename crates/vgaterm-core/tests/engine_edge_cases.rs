//! Edge cases of the byte stream, driven through the public [`Terminal`].

use vgaterm_core::reply::MAX_PENDING_REPLIES;
use vgaterm_core::{
    Dialects, DisplaySurface, EmulatorConfig, Rgb, ScreenConfig, StockPalette, Terminal,
    TerminalConfig, TextAttr,
};

fn terminal(cols: u16, rows: u16) -> Terminal {
    Terminal::with_config(TerminalConfig {
        screen: ScreenConfig {
            cols,
            rows,
            ..ScreenConfig::default()
        },
        ..TerminalConfig::default()
    })
    .expect("valid terminal config")
}

#[test]
fn palette_load_applies_only_on_last_byte() {
    let mut term = terminal(10, 3);
    term.feed_bytes(b"\x1bP");
    term.feed_bytes(&[0x3f; 191]);
    assert_eq!(term.screen().palette(), StockPalette::Default.get());
    assert_eq!(term.screen().refresh_count(), 0);
    assert!(!term.emulator().is_idle());

    term.feed_bytes(&[0x3f]);
    assert_eq!(term.screen().palette().reg(15), Rgb::new(63, 63, 63));
    assert_eq!(term.screen().palette().reg(0), Rgb::new(63, 63, 63));
    assert!(term.emulator().is_idle());
}

#[test]
fn unknown_csi_final_is_dropped() {
    let mut term = terminal(10, 3);
    term.feed_bytes(b"\x1b[99Zx");
    assert_eq!(term.screen().row_text(0), "x");
    assert_eq!(term.screen().cursor_position(), (0, 1));
}

#[test]
fn split_cursor_position_matches_whole() {
    let mut whole = terminal(10, 6);
    whole.feed_bytes(b"\x1b[2;5H");

    let mut split = terminal(10, 6);
    split.feed_bytes(b"\x1b[2");
    assert_eq!(split.screen().cursor_position(), (0, 0));
    split.feed_bytes(b";5H");

    assert_eq!(split.screen().cursor_position(), whole.screen().cursor_position());
    assert_eq!(whole.screen().cursor_position(), (1, 4));
}

#[test]
fn bold_underline_maps_to_bright_cyan() {
    let mut term = terminal(10, 3);
    term.feed_bytes(b"\x1b[1;4m");
    assert_eq!(term.screen().attribute(), TextAttr(0x0B));
}

#[test]
fn avatar_goto_split_across_feeds() {
    let mut term = terminal(10, 6);
    term.feed_bytes(b"\x16");
    term.feed_bytes(b"\x08\x04");
    term.feed_bytes(b"\x03*");
    assert_eq!(term.screen().cell(2, 3).map(|c| c.ch), Some(b'*'));
}

#[test]
fn escape_is_literal_without_escape_dialects() {
    let mut term = Terminal::with_config(TerminalConfig {
        screen: ScreenConfig {
            cols: 10,
            rows: 3,
            ..ScreenConfig::default()
        },
        emulator: EmulatorConfig {
            dialects: Dialects::AVATAR,
            ..EmulatorConfig::default()
        },
    })
    .expect("valid terminal config");
    term.feed_bytes(b"\x1b[2J");
    let row: Vec<u8> = (0..4)
        .filter_map(|col| term.screen().cell(0, col).map(|c| c.ch))
        .collect();
    assert_eq!(row, b"\x1b[2J");
}

#[test]
fn switching_dialects_abandons_pending_sequence() {
    let mut term = terminal(10, 3);
    term.feed_bytes(b"\x1b[3");
    term.set_dialects(Dialects::default());
    term.feed_bytes(b"1mA");
    assert_eq!(term.screen().row_text(0), "1mA");
    assert_eq!(term.screen().attribute(), TextAttr::DEFAULT);
}

#[test]
fn undrained_replies_are_bounded() {
    let mut term = terminal(10, 3);
    term.feed_bytes(b"\x1b[5n");
    for _ in 0..MAX_PENDING_REPLIES * 4 {
        term.feed_bytes(b"\x1b[6n");
    }
    let replies = term.drain_replies();
    assert_eq!(replies.len(), MAX_PENDING_REPLIES);
    assert!(replies.iter().all(|reply| reply.as_slice() == b"\x1b[1;1R"));
}
