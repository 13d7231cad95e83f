//! Map compiler: UDMF text map to the engine's binary lump formats.
//!
//! A compiled map is five lumps, read by the engine from
//! `/maps/<name>/{vertices,sectors,walls,patches,flats}`:
//!
//! - vertex: `i16 x, i16 y`
//! - sector: `u16 wall_count, u16 first_wall, i16 floor_height,
//!   i16 ceiling_height, u8 floor_flat, u8 ceiling_flat`
//! - wall: `u16 v1, u16 v2, u16 neighbor, u8 xoffset, u8 yoffset,
//!   u8 top, u8 middle, u8 bottom`
//! - patch/flat name tables: each name zero-padded to 8 bytes, in id order
//!
//! All fields little-endian. Each sector's walls are a contiguous slice of
//! the global wall array forming one closed loop: wall `i`'s end vertex is
//! wall `(i + 1) % count`'s start vertex.

pub mod compile;
pub mod names;
pub mod writer;

pub use compile::compile;
pub use names::NameTable;
pub use writer::{compile_level, encode, MapLumps};

use serde::Serialize;

/// Neighbor value of a one-sided wall (no sector on the far side).
pub const NO_NEIGHBOR: u16 = u16::MAX;

/// A map vertex, rounded to integer map units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vertex {
    pub x: i16,
    pub y: i16,
}

/// A sector: a closed floor/ceiling region bounded by a wall loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sector {
    pub wall_count: u16,
    pub first_wall: u16,
    pub floor_height: i16,
    pub ceiling_height: i16,
    pub floor_flat: u8,
    pub ceiling_flat: u8,
}

/// A directed wall segment on a sector boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Wall {
    pub v1: u16,
    pub v2: u16,
    /// Sector on the far side, or [`NO_NEIGHBOR`] for a one-sided wall.
    pub neighbor: u16,
    pub xoffset: u8,
    pub yoffset: u8,
    /// Texture ids from the wall's sidedef; 0 means no texture.
    pub top: u8,
    pub middle: u8,
    pub bottom: u8,
}

/// A fully resolved map, ready for encoding.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledMap {
    pub vertices: Vec<Vertex>,
    pub sectors: Vec<Sector>,
    pub walls: Vec<Wall>,
    pub patch_names: NameTable,
    pub flat_names: NameTable,
}
