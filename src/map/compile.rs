//! Geometry resolution: from the parsed UDMF block structure to a
//! [`CompiledMap`].
//!
//! The interesting part is loop stitching. UDMF lists linedefs in arbitrary
//! order, but the engine wants each sector's walls as one closed traversal,
//! so for every sector we collect its directed walls into a bag and then
//! chain them end to start. The continuation search is a linear scan taking
//! the first match in bag order; with two candidate continuations (a
//! branching boundary) that first match is the frozen, deterministic pick.
//! The scan makes stitching O(n^2) per sector, which is fine at the tens of
//! walls a sector actually has.

use crate::error::{Error, Result};
use crate::map::{CompiledMap, NameTable, Sector, Vertex, Wall, NO_NEIGHBOR};
use crate::udmf::{Block, Value};

/// Resolve a parsed map document into compiled geometry.
///
/// Requires the `vertex`, `sector`, `linedef` and `sidedef` block lists;
/// every cross reference is bounds-checked.
pub fn compile(doc: &Block) -> Result<CompiledMap> {
    let vertex_blocks = required_blocks(doc, "vertex")?;
    let sector_blocks = required_blocks(doc, "sector")?;
    let linedef_blocks = required_blocks(doc, "linedef")?;
    let sidedef_blocks = required_blocks(doc, "sidedef")?;

    if vertex_blocks.len() > (u16::MAX as usize) + 1 {
        return Err(Error::Schema(format!(
            "too many vertices: {}",
            vertex_blocks.len()
        )));
    }
    // u16::MAX is reserved as the no-neighbor sentinel.
    if sector_blocks.len() >= u16::MAX as usize {
        return Err(Error::Schema(format!(
            "too many sectors: {}",
            sector_blocks.len()
        )));
    }

    let mut vertices = Vec::with_capacity(vertex_blocks.len());
    for (i, block) in vertex_blocks.iter().enumerate() {
        vertices.push(Vertex {
            x: round_coordinate(block, "x", i)?,
            y: round_coordinate(block, "y", i)?,
        });
    }

    // Distribute directed walls into per-sector bags. A two-sided linedef
    // contributes one wall to each side, each seeing the other sector as
    // its neighbor and carrying its own sidedef's offsets and textures.
    let mut patch_names = NameTable::new();
    let mut bags: Vec<Vec<Wall>> = vec![Vec::new(); sector_blocks.len()];
    for (i, linedef) in linedef_blocks.iter().enumerate() {
        let ctx = Ctx("linedef", i);
        let v1 = index_field(linedef, "v1", ctx, vertices.len())? as u16;
        let v2 = index_field(linedef, "v2", ctx, vertices.len())? as u16;
        let front_id = index_field(linedef, "sidefront", ctx, sidedef_blocks.len())?;
        let front = resolve_sidedef(
            &sidedef_blocks[front_id],
            front_id,
            sector_blocks.len(),
            &mut patch_names,
        )?;
        if bool_field(linedef, "twosided", ctx)? {
            let back_id = index_field(linedef, "sideback", ctx, sidedef_blocks.len())?;
            let back = resolve_sidedef(
                &sidedef_blocks[back_id],
                back_id,
                sector_blocks.len(),
                &mut patch_names,
            )?;
            bags[front.sector].push(front.wall(v1, v2, back.sector as u16));
            bags[back.sector].push(back.wall(v2, v1, front.sector as u16));
        } else {
            bags[front.sector].push(front.wall(v1, v2, NO_NEIGHBOR));
        }
    }

    // Stitch every bag into a closed loop and concatenate the loops into
    // the global wall array, in sector order.
    let mut flat_names = NameTable::new();
    let mut sectors = Vec::with_capacity(sector_blocks.len());
    let mut walls = Vec::new();
    for (i, block) in sector_blocks.iter().enumerate() {
        let ctx = Ctx("sector", i);
        let ordered = stitch_loop(i, std::mem::take(&mut bags[i]))?;
        if walls.len() + ordered.len() > (u16::MAX as usize) + 1 {
            return Err(Error::Schema("too many walls".to_string()));
        }
        sectors.push(Sector {
            wall_count: ordered.len() as u16,
            first_wall: walls.len() as u16,
            floor_height: height_field(block, "heightfloor", ctx)?,
            ceiling_height: height_field(block, "heightceiling", ctx)?,
            floor_flat: flat_names.intern(Some(string_field(block, "texturefloor", ctx)?))?,
            ceiling_flat: flat_names
                .intern(Some(string_field(block, "textureceiling", ctx)?))?,
        });
        walls.extend(ordered);
    }

    Ok(CompiledMap {
        vertices,
        sectors,
        walls,
        patch_names,
        flat_names,
    })
}

/// Order a bag of directed walls into a single closed traversal.
///
/// The loop is seeded with the first wall in bag order; each step removes
/// the first remaining wall whose start vertex equals the current tail's
/// end vertex. Running out of candidates before the bag is empty means the
/// boundary is broken into several chains or cycles; failure to wrap
/// around at the end means it never closes. Both abort the compile.
fn stitch_loop(sector: usize, mut bag: Vec<Wall>) -> Result<Vec<Wall>> {
    if bag.is_empty() {
        return Err(Error::Geometry {
            sector,
            message: "sector has no walls".to_string(),
        });
    }
    let mut ordered = Vec::with_capacity(bag.len());
    ordered.push(bag.remove(0));
    let mut tail = ordered[0].v2;
    while !bag.is_empty() {
        match bag.iter().position(|w| w.v1 == tail) {
            Some(next) => {
                let wall = bag.remove(next);
                tail = wall.v2;
                ordered.push(wall);
            }
            None => {
                return Err(Error::Geometry {
                    sector,
                    message: format!(
                        "no wall continues from vertex {}; boundary is not a single loop",
                        tail
                    ),
                });
            }
        }
    }
    if tail != ordered[0].v1 {
        return Err(Error::Geometry {
            sector,
            message: format!(
                "boundary does not close: ends at vertex {}, started at vertex {}",
                tail, ordered[0].v1
            ),
        });
    }
    Ok(ordered)
}

/// Sidedef data shared by both walls of a two-sided linedef's line.
struct SideInfo {
    sector: usize,
    xoffset: u8,
    yoffset: u8,
    top: u8,
    middle: u8,
    bottom: u8,
}

impl SideInfo {
    fn wall(&self, v1: u16, v2: u16, neighbor: u16) -> Wall {
        Wall {
            v1,
            v2,
            neighbor,
            xoffset: self.xoffset,
            yoffset: self.yoffset,
            top: self.top,
            middle: self.middle,
            bottom: self.bottom,
        }
    }
}

fn resolve_sidedef(
    block: &Block,
    index: usize,
    sector_count: usize,
    patch_names: &mut NameTable,
) -> Result<SideInfo> {
    let ctx = Ctx("sidedef", index);
    Ok(SideInfo {
        sector: index_field(block, "sector", ctx, sector_count)?,
        xoffset: offset_field(block, "offsetx", ctx)?,
        yoffset: offset_field(block, "offsety", ctx)?,
        top: patch_names.intern(optional_string_field(block, "texturetop", ctx)?)?,
        middle: patch_names.intern(optional_string_field(block, "texturemiddle", ctx)?)?,
        bottom: patch_names.intern(optional_string_field(block, "texturebottom", ctx)?)?,
    })
}

// ============================================================================
// Typed field access
// ============================================================================

/// Entity name and index, for error messages.
#[derive(Clone, Copy)]
struct Ctx(&'static str, usize);

impl std::fmt::Display for Ctx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.1)
    }
}

fn required_blocks<'a>(doc: &'a Block, key: &str) -> Result<&'a [Block]> {
    doc.blocks(key)
        .ok_or_else(|| Error::Schema(format!("missing `{}` blocks", key)))
}

/// Integer field used as an index into `limit` entities.
fn index_field(block: &Block, key: &str, ctx: Ctx, limit: usize) -> Result<usize> {
    let value = block
        .value(key)
        .ok_or_else(|| Error::Schema(format!("{}: missing `{}`", ctx, key)))?;
    let raw = value
        .as_int()
        .ok_or_else(|| Error::Schema(format!("{}: `{}` must be an integer", ctx, key)))?;
    let index = usize::try_from(raw)
        .map_err(|_| Error::Schema(format!("{}: `{}` = {} is negative", ctx, key, raw)))?;
    if index >= limit {
        return Err(Error::Schema(format!(
            "{}: `{}` = {} is out of range (have {})",
            ctx, key, raw, limit
        )));
    }
    Ok(index)
}

/// Coordinate rounded to the nearest integer, ties to even, to match the
/// reference converter's float rounding exactly.
fn round_coordinate(block: &Block, key: &str, index: usize) -> Result<i16> {
    let ctx = Ctx("vertex", index);
    let value = block
        .value(key)
        .ok_or_else(|| Error::Schema(format!("{}: missing `{}`", ctx, key)))?;
    let raw = value
        .as_f64()
        .ok_or_else(|| Error::Schema(format!("{}: `{}` must be a number", ctx, key)))?;
    let rounded = raw.round_ties_even();
    if rounded < f64::from(i16::MIN) || rounded > f64::from(i16::MAX) {
        return Err(Error::Schema(format!(
            "{}: `{}` = {} does not fit the map unit range",
            ctx, key, raw
        )));
    }
    Ok(rounded as i16)
}

/// Optional height, defaulting to 0.
fn height_field(block: &Block, key: &str, ctx: Ctx) -> Result<i16> {
    let Some(value) = block.value(key) else {
        return Ok(0);
    };
    let raw = value
        .as_int()
        .ok_or_else(|| Error::Schema(format!("{}: `{}` must be an integer", ctx, key)))?;
    i16::try_from(raw)
        .map_err(|_| Error::Schema(format!("{}: `{}` = {} does not fit i16", ctx, key, raw)))
}

/// Optional texel offset, defaulting to 0. The wall record stores it as a
/// byte.
fn offset_field(block: &Block, key: &str, ctx: Ctx) -> Result<u8> {
    let Some(value) = block.value(key) else {
        return Ok(0);
    };
    let raw = value
        .as_int()
        .ok_or_else(|| Error::Schema(format!("{}: `{}` must be an integer", ctx, key)))?;
    u8::try_from(raw)
        .map_err(|_| Error::Schema(format!("{}: `{}` = {} does not fit a byte", ctx, key, raw)))
}

fn string_field<'a>(block: &'a Block, key: &str, ctx: Ctx) -> Result<&'a str> {
    optional_string_field(block, key, ctx)?
        .ok_or_else(|| Error::Schema(format!("{}: missing `{}`", ctx, key)))
}

fn optional_string_field<'a>(block: &'a Block, key: &str, ctx: Ctx) -> Result<Option<&'a str>> {
    match block.value(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(Error::Schema(format!(
            "{}: `{}` must be a string",
            ctx, key
        ))),
    }
}

/// Optional flag, defaulting to false.
fn bool_field(block: &Block, key: &str, ctx: Ctx) -> Result<bool> {
    match block.value(key) {
        None => Ok(false),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| Error::Schema(format!("{}: `{}` must be a boolean", ctx, key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::udmf::parse;

    fn triangle_source() -> &'static str {
        r#"
        vertex { x = 0.0; y = 0.0; }
        vertex { x = 10.0; y = 0.0; }
        vertex { x = 10.0; y = 10.0; }
        sector { heightfloor = 0; heightceiling = 64; texturefloor = "FLAT1"; textureceiling = "FLAT1"; }
        linedef { v1 = 0; v2 = 1; sidefront = 0; }
        linedef { v1 = 1; v2 = 2; sidefront = 1; }
        linedef { v1 = 2; v2 = 0; sidefront = 2; }
        sidedef { sector = 0; }
        sidedef { sector = 0; }
        sidedef { sector = 0; }
        "#
    }

    #[test]
    fn compiles_a_triangle() {
        let map = compile(&parse(triangle_source()).unwrap()).unwrap();
        assert_eq!(map.vertices.len(), 3);
        assert_eq!(map.sectors.len(), 1);
        assert_eq!(map.sectors[0].wall_count, 3);
        assert_eq!(map.sectors[0].first_wall, 0);
        assert_eq!(map.sectors[0].ceiling_height, 64);
        let order: Vec<_> = map.walls.iter().map(|w| (w.v1, w.v2)).collect();
        assert_eq!(order, vec![(0, 1), (1, 2), (2, 0)]);
        for wall in &map.walls {
            assert_eq!(wall.neighbor, NO_NEIGHBOR);
        }
        assert_eq!(map.flat_names.names(), &["flat1"]);
        assert!(map.patch_names.is_empty());
    }

    #[test]
    fn stitching_reorders_shuffled_walls() {
        // Same triangle, linedefs listed out of traversal order.
        let source = r#"
        vertex { x = 0.0; y = 0.0; }
        vertex { x = 10.0; y = 0.0; }
        vertex { x = 10.0; y = 10.0; }
        sector { texturefloor = "F"; textureceiling = "C"; }
        linedef { v1 = 2; v2 = 0; sidefront = 0; }
        linedef { v1 = 0; v2 = 1; sidefront = 1; }
        linedef { v1 = 1; v2 = 2; sidefront = 2; }
        sidedef { sector = 0; }
        sidedef { sector = 0; }
        sidedef { sector = 0; }
        "#;
        let map = compile(&parse(source).unwrap()).unwrap();
        let order: Vec<_> = map.walls.iter().map(|w| (w.v1, w.v2)).collect();
        // Seeded with the first wall in bag order, (2,0).
        assert_eq!(order, vec![(2, 0), (0, 1), (1, 2)]);
    }

    #[test]
    fn two_sided_linedefs_make_two_walls() {
        // Two unit-square sectors sharing the edge between vertices 1 and 2.
        let source = r#"
        vertex { x = 0.0; y = 0.0; }
        vertex { x = 1.0; y = 0.0; }
        vertex { x = 1.0; y = 1.0; }
        vertex { x = 0.0; y = 1.0; }
        vertex { x = 2.0; y = 0.0; }
        vertex { x = 2.0; y = 1.0; }
        sector { texturefloor = "A"; textureceiling = "A"; }
        sector { texturefloor = "B"; textureceiling = "B"; }
        linedef { v1 = 0; v2 = 1; sidefront = 0; }
        linedef { v1 = 1; v2 = 2; sidefront = 1; sideback = 2; twosided = true; }
        linedef { v1 = 2; v2 = 3; sidefront = 3; }
        linedef { v1 = 3; v2 = 0; sidefront = 4; }
        linedef { v1 = 1; v2 = 4; sidefront = 5; }
        linedef { v1 = 4; v2 = 5; sidefront = 6; }
        linedef { v1 = 5; v2 = 2; sidefront = 7; }
        sidedef { sector = 0; }
        sidedef { sector = 0; offsetx = 16; texturemiddle = "MID"; }
        sidedef { sector = 1; texturemiddle = "MID2"; }
        sidedef { sector = 0; }
        sidedef { sector = 0; }
        sidedef { sector = 1; }
        sidedef { sector = 1; }
        sidedef { sector = 1; }
        "#;
        let map = compile(&parse(source).unwrap()).unwrap();
        assert_eq!(map.sectors.len(), 2);
        assert_eq!(map.sectors[0].wall_count, 4);
        assert_eq!(map.sectors[1].wall_count, 4);
        assert_eq!(map.sectors[1].first_wall, 4);

        // Front side of the shared line, in sector 0's loop.
        let front = map.walls.iter().find(|w| w.v1 == 1 && w.v2 == 2).unwrap();
        assert_eq!(front.neighbor, 1);
        assert_eq!(front.xoffset, 16);
        assert_eq!(front.middle, map.patch_names.get("mid").unwrap());

        // Back side runs the other way, in sector 1's loop.
        let back = map.walls.iter().find(|w| w.v1 == 2 && w.v2 == 1).unwrap();
        assert_eq!(back.neighbor, 0);
        assert_eq!(back.xoffset, 0);
        assert_eq!(back.middle, map.patch_names.get("mid2").unwrap());

        // Each sector's slice is itself closed.
        for sector in &map.sectors {
            let s = sector.first_wall as usize;
            let n = sector.wall_count as usize;
            let slice = &map.walls[s..s + n];
            for (i, wall) in slice.iter().enumerate() {
                assert_eq!(wall.v2, slice[(i + 1) % n].v1);
            }
        }
    }

    #[test]
    fn twosided_false_is_one_sided() {
        let source = r#"
        vertex { x = 0.0; y = 0.0; }
        vertex { x = 10.0; y = 0.0; }
        vertex { x = 10.0; y = 10.0; }
        sector { texturefloor = "F"; textureceiling = "C"; }
        linedef { v1 = 0; v2 = 1; sidefront = 0; twosided = false; }
        linedef { v1 = 1; v2 = 2; sidefront = 1; }
        linedef { v1 = 2; v2 = 0; sidefront = 2; }
        sidedef { sector = 0; }
        sidedef { sector = 0; }
        sidedef { sector = 0; }
        "#;
        let map = compile(&parse(source).unwrap()).unwrap();
        assert_eq!(map.walls.len(), 3);
        assert_eq!(map.walls[0].neighbor, NO_NEIGHBOR);
    }

    #[test]
    fn open_chain_fails() {
        let source = r#"
        vertex { x = 0.0; y = 0.0; }
        vertex { x = 10.0; y = 0.0; }
        vertex { x = 10.0; y = 10.0; }
        sector { texturefloor = "F"; textureceiling = "C"; }
        linedef { v1 = 0; v2 = 1; sidefront = 0; }
        linedef { v1 = 1; v2 = 2; sidefront = 1; }
        sidedef { sector = 0; }
        sidedef { sector = 0; }
        "#;
        match compile(&parse(source).unwrap()) {
            Err(Error::Geometry { sector, .. }) => assert_eq!(sector, 0),
            other => panic!("expected geometry error, got {:?}", other),
        }
    }

    #[test]
    fn disjoint_cycles_fail() {
        // Two triangles assigned to one sector: a valid-looking bag that is
        // not a single loop.
        let source = r#"
        vertex { x = 0.0; y = 0.0; }
        vertex { x = 1.0; y = 0.0; }
        vertex { x = 1.0; y = 1.0; }
        vertex { x = 5.0; y = 0.0; }
        vertex { x = 6.0; y = 0.0; }
        vertex { x = 6.0; y = 1.0; }
        sector { texturefloor = "F"; textureceiling = "C"; }
        linedef { v1 = 0; v2 = 1; sidefront = 0; }
        linedef { v1 = 1; v2 = 2; sidefront = 0; }
        linedef { v1 = 2; v2 = 0; sidefront = 0; }
        linedef { v1 = 3; v2 = 4; sidefront = 0; }
        linedef { v1 = 4; v2 = 5; sidefront = 0; }
        linedef { v1 = 5; v2 = 3; sidefront = 0; }
        sidedef { sector = 0; }
        "#;
        assert!(matches!(
            compile(&parse(source).unwrap()),
            Err(Error::Geometry { sector: 0, .. })
        ));
    }

    #[test]
    fn empty_sector_fails() {
        let source = r#"
        vertex { x = 0.0; y = 0.0; }
        vertex { x = 10.0; y = 0.0; }
        vertex { x = 10.0; y = 10.0; }
        sector { texturefloor = "F"; textureceiling = "C"; }
        sector { texturefloor = "F"; textureceiling = "C"; }
        linedef { v1 = 0; v2 = 1; sidefront = 0; }
        linedef { v1 = 1; v2 = 2; sidefront = 0; }
        linedef { v1 = 2; v2 = 0; sidefront = 0; }
        sidedef { sector = 0; }
        "#;
        assert!(matches!(
            compile(&parse(source).unwrap()),
            Err(Error::Geometry { sector: 1, .. })
        ));
    }

    #[test]
    fn branching_boundary_takes_first_match() {
        // Vertex 1 has two outgoing walls; the stitcher must pick the first
        // one in bag order, every time.
        let mut bag = vec![
            Wall { v1: 0, v2: 1, neighbor: NO_NEIGHBOR, xoffset: 0, yoffset: 0, top: 0, middle: 1, bottom: 0 },
            Wall { v1: 1, v2: 2, neighbor: NO_NEIGHBOR, xoffset: 0, yoffset: 0, top: 0, middle: 2, bottom: 0 },
            Wall { v1: 1, v2: 2, neighbor: NO_NEIGHBOR, xoffset: 0, yoffset: 0, top: 0, middle: 3, bottom: 0 },
            Wall { v1: 2, v2: 1, neighbor: NO_NEIGHBOR, xoffset: 0, yoffset: 0, top: 0, middle: 4, bottom: 0 },
            Wall { v1: 2, v2: 0, neighbor: NO_NEIGHBOR, xoffset: 0, yoffset: 0, top: 0, middle: 5, bottom: 0 },
        ];
        let first = stitch_loop(0, bag.clone()).unwrap();
        let picks: Vec<_> = first.iter().map(|w| w.middle).collect();
        assert_eq!(picks, vec![1, 2, 4, 3, 5]);
        // Deterministic across runs.
        assert_eq!(stitch_loop(0, bag.clone()).unwrap(), first);
        // And sensitive only to bag order, not to anything hidden: swapping
        // the two candidates swaps the pick.
        bag.swap(1, 2);
        let swapped = stitch_loop(0, bag).unwrap();
        let picks: Vec<_> = swapped.iter().map(|w| w.middle).collect();
        assert_eq!(picks, vec![1, 3, 4, 2, 5]);
    }

    #[test]
    fn missing_entities_are_schema_errors() {
        for missing in ["vertex", "sector", "linedef", "sidedef"] {
            let source = triangle_source()
                .lines()
                .filter(|l| !l.trim_start().starts_with(missing))
                .collect::<Vec<_>>()
                .join("\n");
            match compile(&parse(&source).unwrap()) {
                Err(Error::Schema(msg)) => assert!(msg.contains(missing), "{}", msg),
                other => panic!("expected schema error for {}, got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn out_of_range_references_are_schema_errors() {
        let source = triangle_source().replace("v2 = 1", "v2 = 9");
        assert!(matches!(
            compile(&parse(&source).unwrap()),
            Err(Error::Schema(_))
        ));
        let source = triangle_source().replace("sidefront = 2", "sidefront = 3");
        assert!(matches!(
            compile(&parse(&source).unwrap()),
            Err(Error::Schema(_))
        ));
        let source = triangle_source().replace("sector = 0; }\n", "sector = 1; }\n");
        assert!(matches!(
            compile(&parse(&source).unwrap()),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn coordinates_round_ties_to_even() {
        let source = r#"
        vertex { x = 2.5; y = -2.5; }
        vertex { x = 3.5; y = 0.5; }
        vertex { x = 10.0; y = 10.0; }
        sector { texturefloor = "F"; textureceiling = "C"; }
        linedef { v1 = 0; v2 = 1; sidefront = 0; }
        linedef { v1 = 1; v2 = 2; sidefront = 0; }
        linedef { v1 = 2; v2 = 0; sidefront = 0; }
        sidedef { sector = 0; }
        "#;
        let map = compile(&parse(source).unwrap()).unwrap();
        assert_eq!(map.vertices[0], Vertex { x: 2, y: -2 });
        assert_eq!(map.vertices[1], Vertex { x: 4, y: 0 });
    }

    #[test]
    fn texture_ids_intern_in_encounter_order() {
        let source = r#"
        vertex { x = 0.0; y = 0.0; }
        vertex { x = 10.0; y = 0.0; }
        vertex { x = 10.0; y = 10.0; }
        sector { texturefloor = "FLOOR"; textureceiling = "CEIL"; }
        linedef { v1 = 0; v2 = 1; sidefront = 0; }
        linedef { v1 = 1; v2 = 2; sidefront = 1; }
        linedef { v1 = 2; v2 = 0; sidefront = 2; }
        sidedef { sector = 0; texturemiddle = "WALL1"; }
        sidedef { sector = 0; texturetop = "TRIM"; texturemiddle = "WALL1"; }
        sidedef { sector = 0; texturemiddle = "WALL2"; }
        "#;
        let map = compile(&parse(source).unwrap()).unwrap();
        // Per sidedef the order is top, middle, bottom, in linedef order.
        assert_eq!(map.patch_names.names(), &["wall1", "trim", "wall2"]);
        assert_eq!(map.flat_names.names(), &["floor", "ceil"]);
    }
}
