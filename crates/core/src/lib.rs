//! This crate is used as a utilities library for common functionality across
//! [sniff](https://crates.io/crates/sniff) modules.
//!
//! By default, this crate only enables the data module, which contains
//! [`DataCursorRef`](data::DataCursorRef), a borrowed cursor for reading endian-specific data out
//! of a byte buffer, and the identify module with the [`ContentType`](identify::ContentType)
//! result shared by all identifiers.
//!
//! Additionally, there is a time module behind the `time` feature, which renders Unix timestamps.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
mod no_std {
    extern crate alloc;
    pub use alloc::format;
    pub use alloc::string::String;
    pub use alloc::vec::Vec;
}

//Always have data enabled
pub mod data;
//These are all set behind feature flags
#[cfg(all(feature = "time", feature = "std"))]
pub mod time;

pub mod identify;
pub mod util;

pub mod prelude;
