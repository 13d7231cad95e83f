//! Pixel transcoders: PNG sources to the engine's image formats.
//!
//! Every format indexes the same 17-step grayscale ramp ([`palette`]).
//! The conversions are loss-less byte shuffles; anything that cannot be
//! represented (a color off the ramp, a bad dimension, an overlong run)
//! aborts with a constraint error rather than approximating.

pub mod bob;
pub mod flat;
pub mod font;
pub mod palette;
pub mod patch;
pub mod sprite;

pub use bob::convert_bob;
pub use flat::convert_flat;
pub use font::convert_font;
pub use patch::convert_patch;
pub use sprite::convert_sprite;
