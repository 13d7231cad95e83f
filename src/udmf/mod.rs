//! UDMF (Universal Doom Map Format) block language.
//!
//! A translation unit is a sequence of assignments and blocks:
//!
//! ```text
//! namespace = "zdoom";
//! vertex { x = 0.0; y = 64.0; }
//! vertex { x = 128.0; y = 64.0; }
//! ```
//!
//! The grammar itself is schema-agnostic: blocks nest arbitrarily, and the
//! same tag repeated at one level accumulates into an ordered list. The map
//! compiler in [`crate::map`] imposes the vertex/sector/linedef/sidedef
//! schema on top of this structure.

pub mod parser;

pub use parser::parse;

use std::collections::BTreeMap;

use serde::Serialize;

/// A scalar value on the right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl Value {
    /// Integer value, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value; integers promote to float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

/// What a key maps to inside a block: a single scalar, or the ordered list
/// of sub-blocks sharing that tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Item {
    Value(Value),
    Blocks(Vec<Block>),
}

/// A parsed block: key to scalar-or-block-list. Repeated scalar keys
/// overwrite (last assignment wins), repeated block tags accumulate in
/// source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Block(BTreeMap<String, Item>);

impl Block {
    pub fn new() -> Self {
        Block(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&Item> {
        self.0.get(key)
    }

    /// Scalar value under `key`, if the key holds one.
    pub fn value(&self, key: &str) -> Option<&Value> {
        match self.0.get(key) {
            Some(Item::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// Sub-block list under `key`, if the key holds one.
    pub fn blocks(&self, key: &str) -> Option<&[Block]> {
        match self.0.get(key) {
            Some(Item::Blocks(b)) => Some(b),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Item)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Set a scalar. Returns `false` when the key is already occupied by a
    /// block list, which callers must treat as an error.
    pub fn set_value(&mut self, key: &str, value: Value) -> bool {
        match self.0.get_mut(key) {
            Some(Item::Blocks(_)) => false,
            Some(item) => {
                *item = Item::Value(value);
                true
            }
            None => {
                self.0.insert(key.to_string(), Item::Value(value));
                true
            }
        }
    }

    /// Append a sub-block under `key`. Returns `false` when the key is
    /// already occupied by a scalar.
    pub fn push_block(&mut self, key: &str, block: Block) -> bool {
        match self
            .0
            .entry(key.to_string())
            .or_insert_with(|| Item::Blocks(Vec::new()))
        {
            Item::Blocks(list) => {
                list.push(block);
                true
            }
            Item::Value(_) => false,
        }
    }
}

/// Render a block structure back to UDMF source text.
///
/// Keys come out in sorted order rather than source order, so the text is
/// not byte-identical to the input, but re-parsing it yields an equal
/// structure.
pub fn render(block: &Block) -> String {
    let mut out = String::new();
    render_into(block, 0, &mut out);
    out
}

fn render_into(block: &Block, depth: usize, out: &mut String) {
    for (key, item) in block.iter() {
        match item {
            Item::Value(value) => {
                indent(depth, out);
                out.push_str(key);
                out.push_str(" = ");
                render_value(value, out);
                out.push_str(";\n");
            }
            Item::Blocks(list) => {
                for child in list {
                    indent(depth, out);
                    out.push_str(key);
                    out.push_str("\n");
                    indent(depth, out);
                    out.push_str("{\n");
                    render_into(child, depth + 1, out);
                    indent(depth, out);
                    out.push_str("}\n");
                }
            }
        }
    }
}

fn render_value(value: &Value, out: &mut String) {
    match value {
        Value::Integer(v) => out.push_str(&v.to_string()),
        Value::Float(v) => out.push_str(&render_float(*v)),
        Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        Value::String(v) => {
            out.push('"');
            for c in v.chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        }
    }
}

/// Format a float so the grammar reads it back as a float: the mantissa
/// always carries a decimal point, even when Rust's shortest form (e.g.
/// `1e300`) would drop it.
fn render_float(v: f64) -> String {
    let text = format!("{:?}", v);
    match text.split_once(['e', 'E']) {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            format!("{}.0e{}", mantissa, exponent)
        }
        None if !text.contains('.') => format!("{}.0", text),
        _ => text,
    }
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("    ");
    }
}
