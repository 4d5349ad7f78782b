//! Base page layout: HTML skeleton, navigation and footer.

use maud::{html, Markup, PreEscaped, DOCTYPE};

const SITE_NAME: &str = "Thread Archiver";

/// Inline styles for the archive pages, including the nested reply tree.
const ARCHIVE_STYLE: &str = r"
body { font-family: system-ui, sans-serif; max-width: 60rem; margin: 0 auto; padding: 0 1rem; }
nav ul { display: flex; gap: 1rem; list-style: none; padding: 0; }
.comment { border-left: 2px solid #ccc; margin: 0.5rem 0; padding-left: 0.75rem; }
.comment-meta { font-size: 0.85em; color: #666; }
.alert { padding: 0.75rem 1rem; border-radius: 4px; margin: 1rem 0; }
.alert.error { background: #fdecea; }
.alert.info { background: #e8f0fe; }
.alert.success { background: #e6f4ea; }
.pagination { display: flex; gap: 1rem; margin: 1rem 0; }
.pagination .disabled { color: #999; }
";

/// Base page layout builder.
///
/// ```ignore
/// let page = BaseLayout::new("Latest").render(html! { h1 { "Hello" } });
/// ```
#[derive(Debug, Clone)]
pub struct BaseLayout<'a> {
    title: &'a str,
    refresh: Option<(u32, String)>,
}

impl<'a> BaseLayout<'a> {
    #[must_use]
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            refresh: None,
        }
    }

    /// Send the browser to `url` after `seconds`.
    #[must_use]
    pub fn with_refresh(mut self, seconds: u32, url: &str) -> Self {
        self.refresh = Some((seconds, url.to_string()));
        self
    }

    /// Render the complete HTML page with the given content.
    #[must_use]
    pub fn render(self, content: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    @if let Some((seconds, url)) = &self.refresh {
                        meta http-equiv="refresh" content=(format!("{seconds}; url={url}"));
                    }
                    title { (self.title) " - " (SITE_NAME) }
                    style { (PreEscaped(ARCHIVE_STYLE)) }
                }
                body {
                    (Self::render_header())
                    main {
                        (content)
                    }
                    (Self::render_footer())
                }
            }
        }
    }

    fn render_header() -> Markup {
        html! {
            header {
                nav {
                    ul {
                        li { a href="/" { strong { (SITE_NAME) } } }
                        li { a href="/" { "Latest" } }
                        li { a href="/subs" { "Communities" } }
                    }
                }
            }
        }
    }

    fn render_footer() -> Markup {
        html! {
            footer {
                small { (SITE_NAME) " | " a href="/health" { "Status" } }
            }
        }
    }
}
