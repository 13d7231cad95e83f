//! Pack serializer: flatten the archive tree into the directory-plus-blob
//! layout in one recursive pass with deferred patching.
//!
//! Folder entries are appended before their size and offset are known, so
//! they live as placeholders in the growable entry array (recorded by
//! index, never by pointer) and are patched once their subtree has been
//! walked. Each branch appends entries for all of its children before
//! recursing into any sub-branch, which is what keeps a folder's children
//! contiguous in the directory.

use crate::pack::{Branch, Node, ENTRY_SIZE, FOLDER_FLAG, PACK_MAGIC};

struct RawEntry {
    name: [u8; 8],
    size: u32,
    offset: u32,
}

/// Serialize a tree into a pack archive with `root` as the root folder.
pub fn build_archive(root: &Branch) -> Vec<u8> {
    let mut entries: Vec<RawEntry> = Vec::new();
    let mut blob: Vec<u8> = Vec::new();

    // Header placeholder (entry 0) and the root folder entry (entry 1).
    entries.push(RawEntry {
        name: [0; 8],
        size: FOLDER_FLAG | 1,
        offset: 1,
    });
    entries.push(RawEntry {
        name: encode_root_name(root),
        size: 0,
        offset: 0,
    });
    let first_child = entries.len() as u32;
    let count = walk(root, &mut entries, &mut blob);
    entries[1].size = FOLDER_FLAG | count;
    entries[1].offset = first_child;

    // The header name doubles as magic + total entry count.
    let mut header_name = [0u8; 8];
    header_name[..4].copy_from_slice(&PACK_MAGIC);
    header_name[4..].copy_from_slice(&(entries.len() as u32).to_le_bytes());
    entries[0].name = header_name;

    // Directory length is now known: re-base lump offsets from
    // blob-relative to archive-absolute and write everything out.
    let directory_len = (entries.len() * ENTRY_SIZE) as u32;
    let mut out = Vec::with_capacity(directory_len as usize + blob.len());
    for entry in &entries {
        let offset = if entry.size & FOLDER_FLAG != 0 {
            entry.offset
        } else {
            entry.offset + directory_len
        };
        out.extend_from_slice(&entry.name);
        out.extend_from_slice(&entry.size.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
    }
    out.extend_from_slice(&blob);
    out
}

/// Append entries for `branch`'s children, then recurse into sub-branches,
/// patching their placeholder entries. Returns the child count.
fn walk(branch: &Branch, entries: &mut Vec<RawEntry>, blob: &mut Vec<u8>) -> u32 {
    let mut folders: Vec<(usize, &Branch)> = Vec::new();
    for child in &branch.children {
        match child {
            Node::Lump(lump) => {
                let offset = blob.len() as u32;
                blob.extend_from_slice(lump.content());
                entries.push(RawEntry {
                    name: child.name_bytes(),
                    size: lump.content().len() as u32,
                    offset,
                });
            }
            Node::Branch(sub) => {
                folders.push((entries.len(), sub));
                entries.push(RawEntry {
                    name: child.name_bytes(),
                    size: 0,
                    offset: 0,
                });
            }
        }
    }
    for (index, sub) in folders {
        let first_child = entries.len() as u32;
        let count = walk(sub, entries, blob);
        entries[index].size = FOLDER_FLAG | count;
        entries[index].offset = first_child;
    }
    branch.children.len() as u32
}

fn encode_root_name(root: &Branch) -> [u8; 8] {
    let mut fixed = [0u8; 8];
    let bytes = root.name().as_bytes();
    fixed[..bytes.len()].copy_from_slice(bytes);
    fixed
}
