//! The engine's 17-step grayscale ramp.
//!
//! Source art must use these exact luminance values; index 8 (0x7f) is the
//! midpoint where the ramp switches step direction.

use crate::error::{Error, Result};

pub const PALETTE: [u8; 17] = [
    0x00, 0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x7f, 0x8f, 0x9f, 0xaf, 0xbf, 0xcf, 0xdf,
    0xef, 0xff,
];

/// Ramp index of an exact luminance value.
pub fn palette_index(luma: u8) -> Result<u8> {
    PALETTE
        .iter()
        .position(|&v| v == luma)
        .map(|i| i as u8)
        .ok_or_else(|| {
            Error::Constraint(format!("color {:#04x} is not on the palette ramp", luma))
        })
}
