//! Maud HTML template components for the web UI.
//!
//! - `layout`: Base page layout and navigation
//! - `alert`: Status and error messages
//! - `pagination`: Page navigation controls
//! - `comment`: Nested reply tree of an archived thread

pub mod alert;
pub mod comment;
pub mod layout;
pub mod pagination;

pub use alert::{Alert, AlertVariant};
pub use comment::{CommentTree, ThreadPost};
pub use layout::BaseLayout;
pub use pagination::Pagination;

/// Format a unix timestamp for display.
#[must_use]
pub fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0).map_or_else(
        || timestamp.to_string(),
        |dt| dt.format("%b %d, %Y %H:%M UTC").to_string(),
    )
}
