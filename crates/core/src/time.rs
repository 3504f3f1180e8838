//! Timestamp rendering for date values found inside binary data.

use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
// Re-export time::Error so callers can match on conversion failures without depending on time.
pub use time::Error;

pub const TIME_FORMAT: &[FormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// This function tries to convert a Unix timestamp (seconds, UTC) into a formatted [String].
///
/// # Errors
/// Returns [`ComponentRange`](time::Error::ComponentRange) if the timestamp is outside of the
/// range of representable dates.
#[inline]
pub fn format_timestamp(timestamp: i64) -> Result<String, Error> {
    let time = OffsetDateTime::from_unix_timestamp(timestamp)?;
    Ok(time.format(TIME_FORMAT)?)
}
