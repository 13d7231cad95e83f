//! Bob converter: 1-bit UI bitmaps (glyphs, HUD marks) as two packed
//! bitplanes per row.
//!
//! Source pixels are pure white (drawn white), pure black (drawn black) or
//! pure green (transparent). Each 8-pixel group emits two bytes: the black
//! mask, stored inverted so the renderer can AND it straight onto the
//! framebuffer, then the white mask to OR on top. A final partial group is
//! left-aligned.

use image::DynamicImage;

use crate::error::{Error, Result};

pub fn convert_bob(img: &DynamicImage) -> Result<Vec<u8>> {
    let rgb = img.to_rgb8();
    let width = rgb.width();
    let height = rgb.height();
    if width >= 65536 || height >= 65536 {
        return Err(Error::Constraint(format!(
            "bob dimensions {}x{} out of range",
            width, height
        )));
    }

    let mut data = Vec::with_capacity(4 + (height * width.div_ceil(8) * 2) as usize);
    data.extend_from_slice(&(width as u16).to_le_bytes());
    data.extend_from_slice(&(height as u16).to_le_bytes());
    for y in 0..height {
        let mut run = 0u32;
        let mut black = 0u8;
        let mut white = 0u8;
        for x in 0..width {
            black <<= 1;
            white <<= 1;
            match rgb.get_pixel(x, y).0 {
                [0xff, 0xff, 0xff] => white |= 1,
                [0x00, 0x00, 0x00] => black |= 1,
                [0x00, 0xff, 0x00] => {}
                [r, g, b] => {
                    return Err(Error::Constraint(format!(
                        "bob pixel ({}, {}) is #{:02x}{:02x}{:02x}, expected white, black or green",
                        x, y, r, g, b
                    )));
                }
            }
            run += 1;
            if run == 8 {
                data.push(0xff ^ black);
                data.push(white);
                black = 0;
                white = 0;
                run = 0;
            }
        }
        if run != 0 {
            black <<= 8 - run;
            white <<= 8 - run;
            data.push(0xff ^ black);
            data.push(white);
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const WHITE: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
    const BLACK: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);
    const GREEN: Rgb<u8> = Rgb([0x00, 0xff, 0x00]);

    #[test]
    fn packs_full_byte_rows() {
        let mut img = RgbImage::from_pixel(8, 1, GREEN);
        img.put_pixel(0, 0, WHITE);
        img.put_pixel(1, 0, BLACK);
        img.put_pixel(7, 0, BLACK);
        let bob = convert_bob(&DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(&bob[..4], &[8, 0, 1, 0]);
        // Black mask 0b0100_0001 inverted, white mask 0b1000_0000.
        assert_eq!(&bob[4..], &[0xff ^ 0x41, 0x80]);
    }

    #[test]
    fn partial_groups_are_left_aligned() {
        let mut img = RgbImage::from_pixel(3, 1, GREEN);
        img.put_pixel(0, 0, WHITE);
        img.put_pixel(2, 0, BLACK);
        let bob = convert_bob(&DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(&bob[4..], &[0xff ^ 0b0010_0000, 0b1000_0000]);
    }

    #[test]
    fn two_bytes_per_group_per_row() {
        let img = RgbImage::from_pixel(20, 3, GREEN);
        let bob = convert_bob(&DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(bob.len(), 4 + 3 * 3 * 2);
    }

    #[test]
    fn foreign_colors_fail() {
        let img = RgbImage::from_pixel(4, 4, Rgb([0x12, 0x34, 0x56]));
        assert!(matches!(
            convert_bob(&DynamicImage::ImageRgb8(img)),
            Err(Error::Constraint(_))
        ));
    }
}
