//! Responses to archive submissions.

use maud::{html, Markup};

use crate::components::{Alert, BaseLayout};

/// Seconds before the "archiving" page forwards to the thread.
const REDIRECT_DELAY_SECS: u32 = 3;

/// The archive was dispatched; forward to where it will appear.
#[must_use]
pub fn render_archive_started(thread_id: &str) -> Markup {
    let href = format!("/thread/{thread_id}");
    let content = html! {
        h1 { "Archiving" }
        (Alert::success("The thread is being archived. You will be redirected shortly.")
            .with_link("Go now", &href))
    };

    BaseLayout::new("Archiving")
        .with_refresh(REDIRECT_DELAY_SECS, &href)
        .render(content)
}

/// Nothing newer than the stored archive was fetched.
#[must_use]
pub fn render_already_archived(thread_id: &str) -> Markup {
    let href = format!("/thread/{thread_id}");
    let content = html! {
        h1 { "Already archived" }
        (Alert::info("This thread already exists in the archive.").with_link("View it", &href))
    };

    BaseLayout::new("Already archived").render(content)
}

/// The same thread was submitted within the cooldown window.
#[must_use]
pub fn render_already_requested(thread_id: &str) -> Markup {
    let href = format!("/thread/{thread_id}");
    let content = html! {
        h1 { "Already requested" }
        (Alert::info("This thread was submitted recently. Try again later.")
            .with_link("View the archive", &href))
    };

    BaseLayout::new("Already requested").render(content)
}

#[must_use]
pub fn render_error_page(title: &str, message: &str) -> Markup {
    let content = html! {
        h1 { (title) }
        (Alert::error(message).with_link("Back to the index", "/"))
    };

    BaseLayout::new(title).render(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_started_redirects() {
        let html = render_archive_started("agi5zf").into_string();
        assert!(html.contains(r#"content="3; url=/thread/agi5zf""#));
    }

    #[test]
    fn test_already_archived_links_thread() {
        let html = render_already_archived("agi5zf").into_string();
        assert!(html.contains("already exists"));
        assert!(html.contains(r#"href="/thread/agi5zf""#));
    }
}
