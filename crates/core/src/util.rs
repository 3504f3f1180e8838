//! Utility functions that can't be grouped into any other module.

#[cfg(not(feature = "std"))]
use crate::no_std::*;

/// Converts a file size in bytes to a human-readable format.
///
/// Sizes under 1 KB are printed exactly, everything else is reduced to the largest unit that keeps
/// the value at or above 1, with two decimal places.
#[must_use]
pub fn format_size(length: usize) -> String {
    const UNITS: [&str; 6] = ["KB", "MB", "GB", "TB", "PB", "EB"];
    if length < 1024 {
        return format!("{length} bytes");
    }

    let mut size = length as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if size < 1024.0 {
            break;
        }
        size /= 1024.0;
        unit = next;
    }
    format!("{size:.2} {unit}")
}

#[cfg(test)]
mod tests {
    use super::format_size;

    #[test]
    fn small_sizes_stay_in_bytes() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(1023), "1023 bytes");
    }

    #[test]
    fn larger_sizes_use_units() {
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
