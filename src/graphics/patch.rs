//! Patch converter: wall textures stored column-major behind a one-byte
//! size header.
//!
//! Both dimensions must be powers of two below 65536. The header packs the
//! log2 of each: `(log2 height << 4) | log2 width`, so the renderer can
//! mask texel coordinates instead of dividing.

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::graphics::palette::palette_index;

pub fn convert_patch(img: &DynamicImage) -> Result<Vec<u8>> {
    let luma = img.to_luma8();
    let width = luma.width();
    let height = luma.height();
    check_dimension("width", width)?;
    check_dimension("height", height)?;

    let mut out = Vec::with_capacity(1 + (width * height) as usize);
    out.push(((log2(height) << 4) | log2(width)) as u8);
    for x in 0..width {
        for y in 0..height {
            out.push(palette_index(luma.get_pixel(x, y).0[0])?);
        }
    }
    Ok(out)
}

fn check_dimension(which: &str, value: u32) -> Result<()> {
    if value == 0 || value >= 65536 || !value.is_power_of_two() {
        return Err(Error::Constraint(format!(
            "patch {} must be a power of two below 65536, got {}",
            which, value
        )));
    }
    Ok(())
}

fn log2(value: u32) -> u32 {
    value.trailing_zeros()
}
