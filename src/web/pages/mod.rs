//! Maud-based page templates for the web UI.
//!
//! Each page module exports a render function that produces the complete HTML.

pub mod archive;
pub mod home;
pub mod listing;
pub mod thread;

pub use archive::{
    render_already_archived, render_already_requested, render_archive_started, render_error_page,
};
pub use home::render_home;
pub use listing::{render_category_page, render_subs_page};
pub use thread::render_thread_page;
