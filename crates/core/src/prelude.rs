//! Convenient re-exports of commonly used data types, designed to make crate usage painless.
//!
//! For example, you can work with [`DataCursorRef`] directly, but you have to explicitly refer to
//! [`data::DataError`].
//!
//! The contents of this module can be used by including the following in any module:
//! ```
//! use sniff_core::prelude::*;
//! ```

#[doc(inline)]
pub use crate::data::{DataCursorRef, Endian, ReadExt, SeekExt};
#[doc(inline)]
pub use crate::identify::{ContentType, Identifier};

/// Includes [`data::DataError`], which is used in Results returned by [`DataCursorRef`].
pub mod data {
    #[doc(inline)]
    pub use crate::data::DataError;
}

/// Includes [`util::format_size`], which allows for pretty-print of various lengths.
pub mod util {
    #[doc(inline)]
    pub use crate::util::format_size;
}

/// Includes all time functionality, for rendering timestamps.
#[cfg(feature = "time")]
pub mod time {
    #[doc(inline)]
    pub use crate::time::{format_timestamp, Error};
}
