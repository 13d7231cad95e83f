//! Binary encoder for compiled maps.
//!
//! Record layouts are a wire contract with the engine and must stay
//! bit-exact; see the module docs in [`crate::map`] for the field tables.
//! Encoding cannot fail: every range is validated during resolution.

use crate::error::Result;
use crate::map::{compile, CompiledMap, NameTable};
use crate::udmf;

/// The five encoded lumps of one map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapLumps {
    pub vertices: Vec<u8>,
    pub sectors: Vec<u8>,
    pub walls: Vec<u8>,
    pub patches: Vec<u8>,
    pub flats: Vec<u8>,
}

/// Compile UDMF source text straight to its binary lumps.
pub fn compile_level(source: &str) -> Result<MapLumps> {
    let doc = udmf::parse(source)?;
    let map = compile(&doc)?;
    Ok(encode(&map))
}

/// Encode resolved geometry into the engine's lump formats.
pub fn encode(map: &CompiledMap) -> MapLumps {
    let mut vertices = Vec::with_capacity(map.vertices.len() * 4);
    for v in &map.vertices {
        write_i16(&mut vertices, v.x);
        write_i16(&mut vertices, v.y);
    }

    let mut sectors = Vec::with_capacity(map.sectors.len() * 10);
    for s in &map.sectors {
        write_u16(&mut sectors, s.wall_count);
        write_u16(&mut sectors, s.first_wall);
        write_i16(&mut sectors, s.floor_height);
        write_i16(&mut sectors, s.ceiling_height);
        sectors.push(s.floor_flat);
        sectors.push(s.ceiling_flat);
    }

    let mut walls = Vec::with_capacity(map.walls.len() * 11);
    for w in &map.walls {
        write_u16(&mut walls, w.v1);
        write_u16(&mut walls, w.v2);
        write_u16(&mut walls, w.neighbor);
        walls.push(w.xoffset);
        walls.push(w.yoffset);
        walls.push(w.top);
        walls.push(w.middle);
        walls.push(w.bottom);
    }

    MapLumps {
        vertices,
        sectors,
        walls,
        patches: encode_name_table(&map.patch_names),
        flats: encode_name_table(&map.flat_names),
    }
}

/// Names in id order, each zero-padded to 8 bytes. Lengths were validated
/// at intern time.
fn encode_name_table(table: &NameTable) -> Vec<u8> {
    let mut out = Vec::with_capacity(table.len() * 8);
    for name in table.names() {
        let bytes = name.as_bytes();
        out.extend_from_slice(bytes);
        out.extend(std::iter::repeat(0u8).take(8 - bytes.len()));
    }
    out
}

fn write_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_i16(buf: &mut Vec<u8>, v: i16) {
    buf.extend_from_slice(&v.to_le_bytes());
}
