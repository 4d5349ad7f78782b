//! Index page: submission form and the most recent archives.

use maud::{html, Markup, Render};

use crate::components::{format_timestamp, BaseLayout};
use crate::db::ThreadSummary;

/// Table of archived threads, shared by the index and category pages.
#[derive(Debug, Clone)]
pub struct ThreadTable<'a> {
    pub threads: &'a [ThreadSummary],
    pub show_category: bool,
}

impl Render for ThreadTable<'_> {
    fn render(&self) -> Markup {
        if self.threads.is_empty() {
            return html! { p { em { "Nothing archived yet." } } };
        }

        html! {
            table {
                thead {
                    tr {
                        th { "Title" }
                        @if self.show_category { th { "Community" } }
                        th { "Archived" }
                    }
                }
                tbody {
                    @for thread in self.threads {
                        tr {
                            td { a href=(format!("/thread/{}", thread.thread_id)) { (thread.title) } }
                            @if self.show_category {
                                td { a href=(format!("/r/{}", thread.sub)) { "r/" (thread.sub) } }
                            }
                            td { (format_timestamp(thread.archive_timestamp)) }
                        }
                    }
                }
            }
        }
    }
}

/// Render the index page.
#[must_use]
pub fn render_home(archived_count: i64, latest: &[ThreadSummary]) -> Markup {
    let content = html! {
        h1 { "Archive a thread" }
        form method="post" action="/archive" {
            input type="url" name="archivef" required
                placeholder="https://www.reddit.com/r/rust/comments/abc123/title/";
            " "
            button type="submit" { "Archive" }
        }
        p { (archived_count) " threads archived." }
        h2 { "Latest archives" }
        (ThreadTable { threads: latest, show_category: true })
    };

    BaseLayout::new("Latest").render(content)
}
