//! Font slicer: one sprite sheet to a branch of per-glyph bob lumps.
//!
//! Sheets hold the 96 printable ASCII glyphs (codes 32..128), 16 per row
//! over 6 rows, separated by one-pixel magenta gutters. Glyph widths vary;
//! the shared height is measured down the first column. Each glyph becomes
//! a lump named by its character, so the engine looks glyphs up by string.

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::graphics::bob::convert_bob;
use crate::pack::{Branch, Lump};

const GLYPHS_PER_ROW: u32 = 16;
const GLYPH_ROWS: u32 = 6;
const FIRST_GLYPH: u32 = 32;

const SEPARATOR: [u8; 3] = [0xff, 0x00, 0xff];

pub fn convert_font(img: &DynamicImage, branch_name: &str) -> Result<Branch> {
    let rgb = img.to_rgb8();
    let mut result = Branch::new(branch_name)?;

    // Height of the font, measured until the first separator pixel.
    let mut height = 0;
    while !is_separator(&rgb, 0, height)? {
        height += 1;
    }

    let mut glyph = FIRST_GLYPH;
    let mut y = 0;
    for _ in 0..GLYPH_ROWS {
        let mut x = 0;
        for _ in 0..GLYPHS_PER_ROW {
            let mut width = 0;
            while !is_separator(&rgb, x + width, y)? {
                width += 1;
            }
            let view = img.crop_imm(x, y, width, height);
            let name = char::from_u32(glyph)
                .map(String::from)
                .unwrap_or_default();
            result.push(Lump::new(&name, convert_bob(&view)?)?);
            glyph += 1;
            x += width + 1;
        }
        y += height + 1;
    }
    Ok(result)
}

fn is_separator(rgb: &image::RgbImage, x: u32, y: u32) -> Result<bool> {
    if x >= rgb.width() || y >= rgb.height() {
        return Err(Error::Constraint(format!(
            "font sheet ends at ({}, {}) without a separator",
            x, y
        )));
    }
    Ok(rgb.get_pixel(x, y).0 == SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const GREEN: Rgb<u8> = Rgb([0x00, 0xff, 0x00]);
    const WHITE: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
    const MAGENTA: Rgb<u8> = Rgb([0xff, 0x00, 0xff]);

    /// Build a sheet of 96 2x3 glyphs with one-pixel magenta gutters.
    fn sheet() -> RgbImage {
        let mut img = RgbImage::from_pixel(16 * 3 + 1, 6 * 4 + 1, MAGENTA);
        for row in 0..6u32 {
            for col in 0..16u32 {
                let x0 = col * 3;
                let y0 = row * 4;
                for dx in 0..2 {
                    for dy in 0..3 {
                        img.put_pixel(x0 + dx, y0 + dy, GREEN);
                    }
                }
                // Mark the glyph's top-left so crops are testable.
                img.put_pixel(x0, y0, WHITE);
            }
        }
        img
    }

    #[test]
    fn slices_ninety_six_glyphs() {
        let font = convert_font(&DynamicImage::ImageRgb8(sheet()), "font").unwrap();
        assert_eq!(font.children.len(), 96);
        assert_eq!(font.children[0].name(), " ");
        assert_eq!(font.children[1].name(), "!");
        assert_eq!(font.children[33].name(), "A");
        assert_eq!(font.children[95].name(), "\u{7f}");
    }

    #[test]
    fn glyph_lumps_are_bobs_of_the_cropped_cell() {
        let font = convert_font(&DynamicImage::ImageRgb8(sheet()), "font").unwrap();
        let space = match &font.children[0] {
            crate::pack::Node::Lump(l) => l,
            other => panic!("expected lump, got {:?}", other),
        };
        // 2x3 glyph: u16 w, u16 h, then one byte pair per row.
        assert_eq!(&space.content()[..4], &[2, 0, 3, 0]);
        assert_eq!(space.content().len(), 4 + 3 * 2);
        // Top-left pixel is white, its neighbor transparent green.
        assert_eq!(&space.content()[4..6], &[0xff, 0x80]);
    }

    #[test]
    fn truncated_sheet_fails() {
        // No magenta anywhere: the height scan runs off the image.
        let img = RgbImage::from_pixel(8, 8, GREEN);
        assert!(matches!(
            convert_font(&DynamicImage::ImageRgb8(img), "font"),
            Err(Error::Constraint(_))
        ));
    }
}
