//! Sprite converter: RGBA art to the engine's column/post format.
//!
//! Layout: `i16 offx, i16 offy, u16 width, u16 height`, then one `u32`
//! per column giving its chunk's offset within the post data, then the
//! post data itself. A column chunk is a run of posts
//! `{ u8 length, u8 skip, length bytes }` closed by a 0 byte; `skip` is
//! the transparent gap above the post. Only fully opaque pixels
//! (alpha 255) are drawn, and their colors must sit on the palette ramp.
//!
//! Draw offsets are passed in by the caller; the reference art carried
//! them in a PNG `grAb` chunk, which is read at the filesystem boundary.

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::graphics::palette::palette_index;

pub fn convert_sprite(img: &DynamicImage, offx: i16, offy: i16) -> Result<Vec<u8>> {
    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();
    if width == 0 || width >= 65536 || height == 0 || height >= 65536 {
        return Err(Error::Constraint(format!(
            "sprite dimensions {}x{} out of range",
            width, height
        )));
    }

    let mut result = Vec::new();
    result.extend_from_slice(&offx.to_le_bytes());
    result.extend_from_slice(&offy.to_le_bytes());
    result.extend_from_slice(&(width as u16).to_le_bytes());
    result.extend_from_slice(&(height as u16).to_le_bytes());

    let mut chunks: Vec<u8> = Vec::new();
    for x in 0..width {
        result.extend_from_slice(&(chunks.len() as u32).to_le_bytes());
        for (skip, data) in column_posts(&rgba, x)? {
            if data.len() > 255 {
                return Err(Error::Constraint(format!(
                    "sprite column {} has a post longer than 255 pixels",
                    x
                )));
            }
            if skip > 255 {
                return Err(Error::Constraint(format!(
                    "sprite column {} has a gap longer than 255 pixels",
                    x
                )));
            }
            chunks.push(data.len() as u8);
            chunks.push(skip as u8);
            chunks.extend_from_slice(&data);
        }
        chunks.push(0);
    }
    result.extend_from_slice(&chunks);
    Ok(result)
}

/// Split one column into posts: `(transparent gap above, opaque pixels)`.
fn column_posts(rgba: &image::RgbaImage, x: u32) -> Result<Vec<(u32, Vec<u8>)>> {
    let mut posts = Vec::new();
    let mut current: Option<Vec<u8>> = None;
    let mut post_start = 0u32;
    let mut last_post_end = 0u32;
    for y in 0..rgba.height() {
        let pixel = rgba.get_pixel(x, y);
        if pixel.0[3] == 255 {
            if current.is_none() {
                post_start = y;
                current = Some(Vec::new());
            }
            if let Some(data) = current.as_mut() {
                data.push(palette_index(pixel.0[0])?);
            }
        } else if let Some(data) = current.take() {
            posts.push((post_start - last_post_end, data));
            last_post_end = y;
        }
    }
    if let Some(data) = current.take() {
        posts.push((post_start - last_post_end, data));
    }
    Ok(posts)
}
