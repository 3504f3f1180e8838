//! Convenient re-exports of commonly used data types, designed to make crate usage painless.
//!
//! For example, you can refer to [`RuleBuilder`], but you have to use [`types::StringFlags`].
//!
//! The contents of this module can be used by including the following in any module:
//! ```
//! use sniff_magic::prelude::*;
//! ```

pub use crate::entry::{RuleBuilder, RuleNode};
pub use crate::matcher::{Comparison, MagicMatcher, Operand, Value};
pub use crate::offset::OffsetResolver;
pub use crate::set::{MagicSet, RuleSetBuilder};
pub use crate::Error;

pub mod types {
    pub use crate::types::{DateMatcher, FloatMatcher, NumberMatcher, StringFlags, StringMatcher};
}

pub mod endian {
    pub use crate::endian::{converter_for, EndianConverter};
}

pub mod format {
    pub use crate::format::Template;
}
