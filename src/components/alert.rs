//! Alert boxes for status and error messages.

use maud::{html, Markup, Render};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertVariant {
    Success,
    Error,
    Info,
}

impl AlertVariant {
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self {
            Self::Success => "alert success",
            Self::Error => "alert error",
            Self::Info => "alert info",
        }
    }
}

/// An alert message, optionally followed by a link.
#[derive(Debug, Clone)]
pub struct Alert<'a> {
    pub variant: AlertVariant,
    pub message: &'a str,
    pub link: Option<(&'a str, &'a str)>,
}

impl<'a> Alert<'a> {
    #[must_use]
    pub const fn new(variant: AlertVariant, message: &'a str) -> Self {
        Self {
            variant,
            message,
            link: None,
        }
    }

    #[must_use]
    pub const fn success(message: &'a str) -> Self {
        Self::new(AlertVariant::Success, message)
    }

    #[must_use]
    pub const fn error(message: &'a str) -> Self {
        Self::new(AlertVariant::Error, message)
    }

    #[must_use]
    pub const fn info(message: &'a str) -> Self {
        Self::new(AlertVariant::Info, message)
    }

    /// Append a link with the given label and target.
    #[must_use]
    pub const fn with_link(mut self, label: &'a str, href: &'a str) -> Self {
        self.link = Some((label, href));
        self
    }
}

impl Render for Alert<'_> {
    fn render(&self) -> Markup {
        html! {
            div class=(self.variant.class()) role="alert" {
                (self.message)
                @if let Some((label, href)) = self.link {
                    " "
                    a href=(href) { (label) }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_with_link() {
        let html = Alert::info("Thread already exists.")
            .with_link("View it", "/thread/agi5zf")
            .render()
            .into_string();

        assert!(html.contains(r#"class="alert info""#));
        assert!(html.contains("Thread already exists."));
        assert!(html.contains(r#"<a href="/thread/agi5zf">View it</a>"#));
    }

    #[test]
    fn test_alert_escapes_message() {
        let html = Alert::error("<b>bad</b>").render().into_string();
        assert!(html.contains("&lt;b&gt;bad&lt;/b&gt;"));
    }
}
