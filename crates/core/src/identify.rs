//! The identification interface shared by everything that can recognize a buffer.

#[cfg(not(feature = "std"))]
use crate::no_std::*;

/// What a buffer was identified as.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ContentType {
    /// Short type name, e.g. `png`.
    pub name: String,
    /// Media type, if the matching rules declared one.
    pub mime_type: Option<String>,
    /// Human-readable description assembled from the matching rules.
    pub description: String,
}

impl ContentType {
    pub fn new(name: String, mime_type: Option<String>, description: String) -> Self {
        Self { name, mime_type, description }
    }
}

impl core::fmt::Display for ContentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.description.is_empty() {
            true => f.write_str(&self.name),
            false => f.write_str(&self.description),
        }
    }
}

pub trait Identifier {
    /// Returns the first identification for `data`, if any.
    fn identify(&self, data: &[u8]) -> Option<ContentType>;

    /// Returns every identification for `data`. Callers decide which one to trust.
    fn identify_all(&self, data: &[u8]) -> Vec<ContentType> {
        self.identify(data).into_iter().collect()
    }
}
