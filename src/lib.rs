//! Offline content compiler for the Brute engine.
//!
//! Turns UDMF text maps and directories of PNG art into the engine's
//! binary lump formats and bundles them into a single pack archive. The
//! pipeline is a pure text-in, bytes-out transform: each compilation run
//! owns its own parse tree, name tables and archive tree, so independent
//! maps can be compiled concurrently without shared state.

pub mod error;
pub mod graphics;
pub mod map;
pub mod pack;
pub mod udmf;
pub mod wad;

pub use error::{Error, Result};
