//! Minimal PWAD reader.
//!
//! Source maps arrive inside PWAD containers in UDMF form; all the
//! compiler needs is to locate the `TEXTMAP` lump. Layout:
//!
//! ```text
//! header = { magic: b"PWAD", num_lumps: i32, directory_offset: i32 }
//! dirent = { file_pos: i32, size: i32, name: [u8; 8] }
//! ```

use binrw::{binrw, BinRead};
use std::io::{Cursor, Seek, SeekFrom};

use crate::error::{Error, Result};

#[binrw]
#[brw(little, magic = b"PWAD")]
#[derive(Debug, Clone, Copy)]
pub struct WadHeader {
    pub num_lumps: i32,
    pub directory_offset: i32,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy)]
pub struct WadDirEntry {
    pub file_pos: i32,
    pub size: i32,
    pub name: [u8; 8],
}

impl WadDirEntry {
    pub fn name_str(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

/// A parsed PWAD: decoded directory plus a borrow of the raw bytes.
pub struct Wad<'a> {
    data: &'a [u8],
    directory: Vec<WadDirEntry>,
}

impl<'a> Wad<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Wad<'a>> {
        let mut cursor = Cursor::new(data);
        let header = WadHeader::read(&mut cursor)
            .map_err(|e| Error::Schema(format!("wad: not a PWAD: {}", e)))?;
        let num_lumps = usize::try_from(header.num_lumps)
            .map_err(|_| Error::Schema("wad: negative lump count".to_string()))?;
        let offset = u64::try_from(header.directory_offset)
            .map_err(|_| Error::Schema("wad: negative directory offset".to_string()))?;
        cursor
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::Schema(format!("wad: bad directory offset: {}", e)))?;
        let mut directory = Vec::with_capacity(num_lumps);
        for i in 0..num_lumps {
            let entry = WadDirEntry::read(&mut cursor)
                .map_err(|e| Error::Schema(format!("wad: bad directory entry {}: {}", i, e)))?;
            let start = usize::try_from(entry.file_pos).map_err(|_| {
                Error::Schema(format!("wad: lump {} has a negative position", i))
            })?;
            let size = usize::try_from(entry.size)
                .map_err(|_| Error::Schema(format!("wad: lump {} has a negative size", i)))?;
            if start + size > data.len() {
                return Err(Error::Schema(format!(
                    "wad: lump {} extends past the end of the file",
                    i
                )));
            }
            directory.push(entry);
        }
        Ok(Wad { data, directory })
    }

    pub fn directory(&self) -> &[WadDirEntry] {
        &self.directory
    }

    /// Content of the first lump with the given name, if present.
    pub fn lump(&self, name: &str) -> Option<&'a [u8]> {
        let entry = self.directory.iter().find(|e| e.name_str() == name)?;
        let start = entry.file_pos as usize;
        Some(&self.data[start..start + entry.size as usize])
    }

    /// The UDMF text of the map, from the `TEXTMAP` lump.
    pub fn textmap(&self) -> Result<&'a [u8]> {
        self.lump("TEXTMAP")
            .ok_or_else(|| Error::Schema("wad: no TEXTMAP lump".to_string()))
    }
}
