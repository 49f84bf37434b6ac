//! Email templates
//!
//! Compiled into the binary from `templates/*.hbs`. The HTML body escapes
//! every value; subject and plain text use triple-stash and stay verbatim.

use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::NotifyError;
use crate::domain::{ReleaseDescriptor, TrackedProject};

/// Subject line template
pub const SUBJECT: &str = include_str!("../../templates/subject.hbs");

/// Plain-text body template
pub const TEXT_BODY: &str = include_str!("../../templates/release.txt.hbs");

/// HTML body template
pub const HTML_BODY: &str = include_str!("../../templates/release.html.hbs");

/// Values available to the templates
#[derive(Debug, Serialize)]
struct EmailContext<'a> {
    display_name: &'a str,
    tag: &'a str,
    title: &'a str,
    published: String,
    url: &'a str,
}

/// A fully rendered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Renders release notifications
pub struct EmailTemplates {
    hbs: Handlebars<'static>,
}

impl EmailTemplates {
    pub fn new() -> Result<Self, NotifyError> {
        debug!("EmailTemplates::new: called");
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);

        for (name, source) in [("subject", SUBJECT), ("text", TEXT_BODY), ("html", HTML_BODY)] {
            hbs.register_template_string(name, source)
                .map_err(|e| NotifyError::Template(format!("{}: {}", name, e)))?;
        }

        Ok(Self { hbs })
    }

    /// Render subject and bodies, with the publish time in local time
    pub fn render(&self, project: &TrackedProject, release: &ReleaseDescriptor) -> Result<RenderedEmail, NotifyError> {
        self.render_with_published(project, release, release.published_display())
    }

    fn render_with_published(
        &self,
        project: &TrackedProject,
        release: &ReleaseDescriptor,
        published: String,
    ) -> Result<RenderedEmail, NotifyError> {
        debug!(project = %project.slug(), tag = %release.tag, "EmailTemplates::render: called");
        let context = EmailContext {
            display_name: &project.display_name,
            tag: &release.tag,
            title: release.title(),
            published,
            url: &release.url,
        };

        Ok(RenderedEmail {
            subject: self.hbs.render("subject", &context)?.trim().to_string(),
            text: self.hbs.render("text", &context)?,
            html: self.hbs.render("html", &context)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> TrackedProject {
        TrackedProject::new("CesiumGS", "cesium-unreal", "Cesium Unreal")
    }

    fn release(name: Option<&str>) -> ReleaseDescriptor {
        ReleaseDescriptor {
            tag: "v2.9.0".to_string(),
            name: name.map(String::from),
            published_at: Some("2024-10-01T14:30:00Z".parse().unwrap()),
            url: "https://github.com/CesiumGS/cesium-unreal/releases/tag/v2.9.0".to_string(),
        }
    }

    fn render(project: &TrackedProject, release: &ReleaseDescriptor) -> RenderedEmail {
        EmailTemplates::new()
            .unwrap()
            .render_with_published(project, release, "Tuesday, October 1, 2024 at 14:30:00 UTC".to_string())
            .unwrap()
    }

    #[test]
    fn test_subject() {
        let email = render(&project(), &release(None));
        assert_eq!(email.subject, "🚨 New Cesium Unreal Release: v2.9.0 🚨");
    }

    #[test]
    fn test_text_body() {
        let email = render(&project(), &release(Some("Cesium for Unreal v2.9.0")));
        assert!(email.text.contains("A new release of Cesium Unreal has been detected!"));
        assert!(email.text.contains("Release Name: Cesium for Unreal v2.9.0"));
        assert!(email.text.contains("Tag: v2.9.0"));
        assert!(email.text.contains("Published At: Tuesday, October 1, 2024 at 14:30:00 UTC"));
        assert!(
            email
                .text
                .contains("Release URL: https://github.com/CesiumGS/cesium-unreal/releases/tag/v2.9.0")
        );
    }

    #[test]
    fn test_html_body_falls_back_to_tag() {
        let email = render(&project(), &release(None));
        assert!(email.html.contains("<p><b>Release Name:</b> v2.9.0</p>"));
        assert!(email.html.contains(
            r#"<a href="https://github.com/CesiumGS/cesium-unreal/releases/tag/v2.9.0">"#
        ));
    }

    #[test]
    fn test_html_body_escapes_values() {
        let project = TrackedProject::new("acme", "widgets", "Widgets & <Gadgets>");
        let email = render(&project, &release(Some("<script>alert(1)</script>")));
        assert!(email.html.contains("Widgets &amp; &lt;Gadgets&gt;"));
        assert!(!email.html.contains("<script>"));
        assert!(email.text.contains("Widgets & <Gadgets>"));
        assert_eq!(email.subject, "🚨 New Widgets & <Gadgets> Release: v2.9.0 🚨");
    }
}
