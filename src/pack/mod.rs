//! Pack archives: the engine's single-file asset container.
//!
//! A pack is a flat directory of fixed 16-byte entries followed by the
//! lump payload blob:
//!
//! ```text
//! entry    = { name: [u8; 8], size: u32, offset: u32 }   (little-endian)
//! archive  = [header entry][directory entries...][lump data]
//! ```
//!
//! The top bit of `size` ([`FOLDER_FLAG`]) marks a folder: its child count
//! is `size & !FOLDER_FLAG` and `offset` is the directory index of its
//! first child. A folder's children always occupy a contiguous run of
//! entries. For a lump, `size` is the byte length and `offset` the
//! absolute byte position of its content within the archive. Entry 0 is
//! synthetic: its name field holds the `PACK` magic followed by the total
//! entry count, and it points at the root folder at entry 1.
//!
//! Node names are capped at 8 encoded bytes, checked when the tree is
//! built; serialization itself cannot fail.

pub mod reader;
pub mod writer;

pub use reader::{Archive, PackEntry};
pub use writer::build_archive;

use crate::error::{Error, Result};

/// Top bit of an entry's size field: set for folders.
pub const FOLDER_FLAG: u32 = 0x8000_0000;

/// Bytes per directory entry.
pub const ENTRY_SIZE: usize = 16;

/// Magic bytes in the header entry's name field.
pub const PACK_MAGIC: [u8; 4] = *b"PACK";

/// A node of the archive tree.
#[derive(Debug, Clone)]
pub enum Node {
    Branch(Branch),
    Lump(Lump),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Branch(b) => b.name(),
            Node::Lump(l) => l.name(),
        }
    }

    pub(crate) fn name_bytes(&self) -> [u8; 8] {
        match self {
            Node::Branch(b) => b.name_bytes,
            Node::Lump(l) => l.name_bytes,
        }
    }
}

impl From<Branch> for Node {
    fn from(branch: Branch) -> Self {
        Node::Branch(branch)
    }
}

impl From<Lump> for Node {
    fn from(lump: Lump) -> Self {
        Node::Lump(lump)
    }
}

/// A folder node owning an ordered list of children.
#[derive(Debug, Clone)]
pub struct Branch {
    name: String,
    name_bytes: [u8; 8],
    pub children: Vec<Node>,
}

impl Branch {
    pub fn new(name: &str) -> Result<Self> {
        Ok(Branch {
            name: name.to_string(),
            name_bytes: encode_name(name)?,
            children: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    /// Serialize this branch as a pack archive with itself as the root.
    pub fn serialize(&self) -> Vec<u8> {
        writer::build_archive(self)
    }
}

/// A leaf node owning its content bytes.
#[derive(Debug, Clone)]
pub struct Lump {
    name: String,
    name_bytes: [u8; 8],
    content: Vec<u8>,
}

impl Lump {
    pub fn new(name: &str, content: Vec<u8>) -> Result<Self> {
        Ok(Lump {
            name: name.to_string(),
            name_bytes: encode_name(name)?,
            content,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Encode a node name into the fixed 8-byte field, zero-padded.
fn encode_name(name: &str) -> Result<[u8; 8]> {
    let bytes = name.as_bytes();
    if bytes.len() > 8 {
        return Err(Error::Constraint(format!(
            "node name `{}` is longer than 8 bytes",
            name
        )));
    }
    let mut fixed = [0u8; 8];
    fixed[..bytes.len()].copy_from_slice(bytes);
    Ok(fixed)
}
