//! Translation of platform keycodes into compact button indices.
//!
//! Three disjoint keycode ranges are folded into contiguous bands:
//! d-pad keys to `0..=4`, the original gamepad buttons to `5..=19` and the
//! numbered gamepad buttons to `20..=35`.

use crate::types::{ButtonIndex, MAX_BUTTONS};

pub const KEYCODE_DPAD_UP: i32 = 19;
pub const KEYCODE_DPAD_DOWN: i32 = 20;
pub const KEYCODE_DPAD_LEFT: i32 = 21;
pub const KEYCODE_DPAD_RIGHT: i32 = 22;
pub const KEYCODE_DPAD_CENTER: i32 = 23;

pub const KEYCODE_BUTTON_A: i32 = 96;
pub const KEYCODE_BUTTON_B: i32 = 97;
pub const KEYCODE_BUTTON_C: i32 = 98;
pub const KEYCODE_BUTTON_X: i32 = 99;
pub const KEYCODE_BUTTON_Y: i32 = 100;
pub const KEYCODE_BUTTON_Z: i32 = 101;
pub const KEYCODE_BUTTON_L1: i32 = 102;
pub const KEYCODE_BUTTON_R1: i32 = 103;
pub const KEYCODE_BUTTON_L2: i32 = 104;
pub const KEYCODE_BUTTON_R2: i32 = 105;
pub const KEYCODE_BUTTON_THUMBL: i32 = 106;
pub const KEYCODE_BUTTON_THUMBR: i32 = 107;
pub const KEYCODE_BUTTON_START: i32 = 108;
pub const KEYCODE_BUTTON_SELECT: i32 = 109;
pub const KEYCODE_BUTTON_MODE: i32 = 110;

pub const KEYCODE_BUTTON_1: i32 = 188;
pub const KEYCODE_BUTTON_16: i32 = 203;

/// A contiguous keycode range mapped onto consecutive button indices.
struct Band {
    first: i32,
    last: i32,
    offset: ButtonIndex,
}

impl Band {
    const fn top(&self) -> u32 {
        (self.last - self.first) as u32 + self.offset as u32
    }
}

const BANDS: [Band; 3] = [
    Band {
        first: KEYCODE_DPAD_UP,
        last: KEYCODE_DPAD_CENTER,
        offset: 0,
    },
    Band {
        first: KEYCODE_BUTTON_A,
        last: KEYCODE_BUTTON_MODE,
        offset: 5,
    },
    Band {
        first: KEYCODE_BUTTON_1,
        last: KEYCODE_BUTTON_16,
        offset: 20,
    },
];

// Every band has to fit under the button ceiling.
const _: () = {
    let mut i = 0;
    while i < BANDS.len() {
        assert!(BANDS[i].top() < MAX_BUTTONS);
        i += 1;
    }
};

/// Maps a platform keycode to a button index, or `None` if the keycode is
/// not a gamepad key.
pub fn map_keycode(keycode: i32) -> Option<ButtonIndex> {
    let band = BANDS
        .iter()
        .find(|band| (band.first..=band.last).contains(&keycode))?;
    let button = (keycode - band.first) as u32 + u32::from(band.offset);
    debug_assert!(button < MAX_BUTTONS);
    Some(button as ButtonIndex)
}
