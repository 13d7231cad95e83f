//! Pack directory decode, the read side of [`crate::pack::writer`].
//!
//! The engine walks packs the same way; this implementation backs the
//! archive tests and the CLI's verify pass.

use binrw::{binrw, BinRead};
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::pack::{ENTRY_SIZE, FOLDER_FLAG, PACK_MAGIC};

/// One 16-byte directory entry.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackEntry {
    pub name: [u8; 8],
    pub size: u32,
    pub offset: u32,
}

impl PackEntry {
    pub fn is_folder(&self) -> bool {
        self.size & FOLDER_FLAG != 0
    }

    /// Child count of a folder entry.
    pub fn child_count(&self) -> u32 {
        self.size & !FOLDER_FLAG
    }

    /// Byte length of a lump entry.
    pub fn byte_size(&self) -> u32 {
        self.size
    }

    /// Entry name with zero padding stripped.
    pub fn name_str(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

/// A parsed pack: the decoded directory plus a borrow of the raw bytes.
pub struct Archive<'a> {
    data: &'a [u8],
    entries: Vec<PackEntry>,
}

impl<'a> Archive<'a> {
    /// Decode the directory of a serialized pack.
    pub fn parse(data: &'a [u8]) -> Result<Archive<'a>> {
        let mut cursor = Cursor::new(data);
        let header = PackEntry::read(&mut cursor)
            .map_err(|e| Error::Schema(format!("pack: truncated header: {}", e)))?;
        if header.name[..4] != PACK_MAGIC {
            return Err(Error::Schema("pack: bad magic".to_string()));
        }
        let total = u32::from_le_bytes([
            header.name[4],
            header.name[5],
            header.name[6],
            header.name[7],
        ]) as usize;
        if total < 2 {
            return Err(Error::Schema(format!(
                "pack: entry count {} is too small",
                total
            )));
        }
        if data.len() < total * ENTRY_SIZE {
            return Err(Error::Schema(format!(
                "pack: directory of {} entries does not fit {} bytes",
                total,
                data.len()
            )));
        }
        let mut entries = Vec::with_capacity(total);
        entries.push(header);
        for i in 1..total {
            entries.push(
                PackEntry::read(&mut cursor)
                    .map_err(|e| Error::Schema(format!("pack: bad entry {}: {}", i, e)))?,
            );
        }
        Ok(Archive { data, entries })
    }

    pub fn entries(&self) -> &[PackEntry] {
        &self.entries
    }

    /// The root folder entry (entry 1, pointed at by the header).
    pub fn root(&self) -> &PackEntry {
        &self.entries[1]
    }

    /// The contiguous run of a folder's children.
    pub fn children(&self, folder: &PackEntry) -> Result<&[PackEntry]> {
        if !folder.is_folder() {
            return Err(Error::Schema(format!(
                "pack: `{}` is not a folder",
                folder.name_str()
            )));
        }
        let start = folder.offset as usize;
        let end = start + folder.child_count() as usize;
        if end > self.entries.len() {
            return Err(Error::Schema(format!(
                "pack: children of `{}` are out of range",
                folder.name_str()
            )));
        }
        Ok(&self.entries[start..end])
    }

    /// The content bytes of a lump entry.
    pub fn lump_data(&self, lump: &PackEntry) -> Result<&'a [u8]> {
        if lump.is_folder() {
            return Err(Error::Schema(format!(
                "pack: `{}` is a folder, not a lump",
                lump.name_str()
            )));
        }
        let start = lump.offset as usize;
        let end = start + lump.byte_size() as usize;
        if end > self.data.len() {
            return Err(Error::Schema(format!(
                "pack: lump `{}` is out of range",
                lump.name_str()
            )));
        }
        Ok(&self.data[start..end])
    }

    /// Look up an entry by `/`-separated path from the root.
    pub fn find(&self, path: &str) -> Option<&PackEntry> {
        let mut current = self.root();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            let children = self.children(current).ok()?;
            current = children.iter().find(|e| e.name_str() == part)?;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{Branch, Lump};

    fn sample() -> Vec<u8> {
        let mut root = Branch::new("").unwrap();
        let mut maps = Branch::new("maps").unwrap();
        let mut e1m1 = Branch::new("e1m1").unwrap();
        e1m1.push(Lump::new("vertices", vec![1, 2, 3, 4]).unwrap());
        e1m1.push(Lump::new("sectors", vec![5, 6]).unwrap());
        maps.push(e1m1);
        root.push(maps);
        root.push(Lump::new("palette", vec![7, 8, 9]).unwrap());
        root.serialize()
    }

    #[test]
    fn round_trips_through_the_writer() {
        let bytes = sample();
        let archive = Archive::parse(&bytes).unwrap();
        assert_eq!(archive.entries().len(), 7);
        assert!(archive.root().is_folder());
        assert_eq!(archive.root().child_count(), 2);

        let vertices = archive.find("maps/e1m1/vertices").unwrap();
        assert_eq!(archive.lump_data(vertices).unwrap(), &[1, 2, 3, 4]);
        let sectors = archive.find("maps/e1m1/sectors").unwrap();
        assert_eq!(archive.lump_data(sectors).unwrap(), &[5, 6]);
        let palette = archive.find("palette").unwrap();
        assert_eq!(archive.lump_data(palette).unwrap(), &[7, 8, 9]);
        assert!(archive.find("maps/e1m2").is_none());
    }

    #[test]
    fn children_are_in_insertion_order() {
        let bytes = sample();
        let archive = Archive::parse(&bytes).unwrap();
        let names: Vec<_> = archive
            .children(archive.root())
            .unwrap()
            .iter()
            .map(|e| e.name_str())
            .collect();
        assert_eq!(names, vec!["maps", "palette"]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Archive::parse(b"not a pack"),
            Err(Error::Schema(_))
        ));
        let mut bytes = sample();
        bytes.truncate(3 * ENTRY_SIZE);
        assert!(matches!(Archive::parse(&bytes), Err(Error::Schema(_))));
    }
}
