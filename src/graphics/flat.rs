//! Flat converter: floor/ceiling textures are always 64x64 raw palette
//! indices, row-major, no header.

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::graphics::palette::palette_index;

pub const FLAT_SIZE: u32 = 64;

pub fn convert_flat(img: &DynamicImage) -> Result<Vec<u8>> {
    let luma = img.to_luma8();
    if luma.width() != FLAT_SIZE || luma.height() != FLAT_SIZE {
        return Err(Error::Constraint(format!(
            "flat must be 64x64, got {}x{}",
            luma.width(),
            luma.height()
        )));
    }
    luma.pixels().map(|p| palette_index(p.0[0])).collect()
}
