//! Avatar/0: `0x16 <command> [params]`, plus the `0x19 <char> <count>`
//! repeat run when it is enabled.

use crate::attr::TextAttr;
use crate::emulator::{AVATAR_REPEAT, Stage, move_by};
use crate::surface::DisplaySurface;

const SET_ATTR: u8 = 0x01;
const BLINK: u8 = 0x02;
const UP: u8 = 0x03;
const DOWN: u8 = 0x04;
const LEFT: u8 = 0x05;
const DOWN_ALT: u8 = 0x06;
const CLEAR_EOL: u8 = 0x07;
const GOTO: u8 = 0x08;

#[derive(Debug, Clone, Default)]
pub(crate) struct Avatar {
    stage: Stage,
    params: [u8; 2],
}

impl Avatar {
    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.stage.is_idle()
    }

    pub(crate) fn is_active(&self) -> bool {
        !self.stage.is_idle()
    }

    pub(crate) fn is_repeating(&self) -> bool {
        matches!(
            self.stage,
            Stage::CollectingParams {
                command: AVATAR_REPEAT,
                ..
            }
        )
    }

    pub(crate) fn begin(&mut self) {
        self.stage = Stage::AwaitingCommand;
    }

    pub(crate) fn begin_repeat(&mut self) {
        self.collect(AVATAR_REPEAT, 2);
    }

    pub(crate) fn abort(&mut self) {
        self.stage = Stage::Idle;
    }

    fn collect(&mut self, command: u8, need: usize) {
        self.stage = Stage::CollectingParams {
            command,
            have: 0,
            need,
        };
    }

    pub(crate) fn feed<S: DisplaySurface + ?Sized>(&mut self, s: &mut S, b: u8) {
        match self.stage {
            Stage::Idle => {}
            Stage::AwaitingCommand => {
                self.stage = Stage::Idle;
                match b {
                    SET_ATTR => self.collect(SET_ATTR, 1),
                    GOTO => self.collect(GOTO, 2),
                    BLINK => s.set_attribute(s.attribute().with_blink()),
                    UP => move_by(s, 0, -1),
                    DOWN | DOWN_ALT => move_by(s, 0, 1),
                    LEFT => move_by(s, -1, 0),
                    CLEAR_EOL => s.clear_to_eol(),
                    _ => tracing::trace!(byte = b, "unknown avatar command"),
                }
            }
            Stage::CollectingParams {
                command,
                have,
                need,
            } => {
                self.params[have] = b;
                if have + 1 < need {
                    self.stage = Stage::CollectingParams {
                        command,
                        have: have + 1,
                        need,
                    };
                    return;
                }
                self.stage = Stage::Idle;
                self.dispatch(s, command);
            }
        }
    }

    fn dispatch<S: DisplaySurface + ?Sized>(&mut self, s: &mut S, command: u8) {
        let [p0, p1] = self.params;
        match command {
            SET_ATTR => s.set_attribute(TextAttr(p0)),
            GOTO => s.goto_xy(u16::from(p0), u16::from(p1)),
            AVATAR_REPEAT => {
                if p0 != 0 {
                    for _ in 0..p1 {
                        s.write_char(p0);
                    }
                }
            }
            _ => {}
        }
    }
}
