//! Concrete matchers for the value families magic rules test against.

mod date;
mod float;
pub(crate) mod number;
mod string;

pub use date::DateMatcher;
pub use float::FloatMatcher;
pub use number::NumberMatcher;
pub use string::{StringFlags, StringMatcher};
