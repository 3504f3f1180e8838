//! Construction-time errors. Evaluation itself never fails, it only stops matching.

use snafu::prelude::*;

/// Error conditions for when building rules.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// Thrown if an output template contains a conversion that can't be rendered.
    #[snafu(display("Invalid template {template:?}: {reason}"))]
    InvalidTemplate { template: String, reason: &'static str },
    /// Thrown if a nested rule is added without an enclosing rule one level up.
    #[snafu(display("Rule at level {level} has no enclosing rule at level {}", level.saturating_sub(1)))]
    MissingParent { level: u32 },
    /// Thrown if a matcher is asked to read a value width it doesn't support.
    #[snafu(display("Unsupported value width of {width} bytes"))]
    InvalidWidth { width: usize },
}

pub type Result<T> = core::result::Result<T, Error>;
