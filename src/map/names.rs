//! Asset name interning.
//!
//! Wall and flat textures are referenced by small integer ids in the
//! compiled map; id 0 always means "no texture". Names are case-folded to
//! lowercase, capped at 8 encoded bytes like every lump name, and ids are
//! handed out in first-seen order starting at 1. Ids travel as `u8` on the
//! wire, so a single map may reference at most 255 distinct names per kind.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};

/// One interning table, scoped to a single compilation run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct NameTable {
    names: Vec<String>,
    #[serde(skip)]
    ids: HashMap<String, u8>,
}

impl NameTable {
    pub fn new() -> Self {
        NameTable::default()
    }

    /// Intern a name, returning its id. `None` is the "no texture" case and
    /// always maps to 0. Re-interning a known name returns the same id.
    pub fn intern(&mut self, name: Option<&str>) -> Result<u8> {
        let Some(name) = name else {
            return Ok(0);
        };
        let folded = name.to_lowercase();
        if let Some(&id) = self.ids.get(&folded) {
            return Ok(id);
        }
        if folded.len() > 8 {
            return Err(Error::Constraint(format!(
                "name `{}` is longer than 8 bytes",
                name
            )));
        }
        if self.names.len() >= 255 {
            return Err(Error::Constraint(format!(
                "too many names: `{}` would get id 256, which does not fit a byte",
                name
            )));
        }
        let id = (self.names.len() + 1) as u8;
        self.ids.insert(folded.clone(), id);
        self.names.push(folded);
        Ok(id)
    }

    /// Id of an already-interned name, if any.
    pub fn get(&self, name: &str) -> Option<u8> {
        self.ids.get(&name.to_lowercase()).copied()
    }

    /// Interned names in id order (id 1 first).
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_always_zero() {
        let mut table = NameTable::new();
        assert_eq!(table.intern(None).unwrap(), 0);
        table.intern(Some("STONE")).unwrap();
        assert_eq!(table.intern(None).unwrap(), 0);
    }

    #[test]
    fn ids_are_assigned_in_first_seen_order() {
        let mut table = NameTable::new();
        assert_eq!(table.intern(Some("STONE")).unwrap(), 1);
        assert_eq!(table.intern(Some("BRICK")).unwrap(), 2);
        assert_eq!(table.intern(Some("WOOD")).unwrap(), 3);
        assert_eq!(table.names(), &["stone", "brick", "wood"]);
    }

    #[test]
    fn interning_is_idempotent_and_case_insensitive() {
        let mut table = NameTable::new();
        let id = table.intern(Some("Stone")).unwrap();
        assert_eq!(table.intern(Some("Stone")).unwrap(), id);
        assert_eq!(table.intern(Some("STONE")).unwrap(), id);
        assert_eq!(table.intern(Some("stone")).unwrap(), id);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("sToNe"), Some(id));
    }

    #[test]
    fn long_names_are_rejected() {
        let mut table = NameTable::new();
        assert_eq!(table.intern(Some("12345678")).unwrap(), 1);
        assert!(matches!(
            table.intern(Some("123456789")),
            Err(Error::Constraint(_))
        ));
    }

    #[test]
    fn table_overflows_at_255() {
        let mut table = NameTable::new();
        for i in 0..255 {
            assert_eq!(table.intern(Some(&format!("n{}", i))).unwrap(), (i + 1) as u8);
        }
        assert!(matches!(
            table.intern(Some("onemore")),
            Err(Error::Constraint(_))
        ));
        // Known names still resolve after the table is full.
        assert_eq!(table.intern(Some("n0")).unwrap(), 1);
    }
}
