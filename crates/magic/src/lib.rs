//! This crate contains the magic module for [sniff](https://crates.io/crates/sniff), which
//! identifies byte buffers by evaluating trees of magic rules against them.
//!
//! Each rule reads a value at some offset, tests it, and on a match contributes text to a
//! human-readable description before handing off to its children. See [`entry`] for how a tree is
//! evaluated, and [`builtin::rules`] for a ready-made set covering common formats.

// All public modules
pub mod builtin;
pub mod endian;
pub mod entry;
pub mod format;
pub mod matcher;
pub mod offset;
pub mod set;
pub mod types;

mod error;
pub use error::{Error, Result};

// Prelude, for convenience
pub mod prelude;
