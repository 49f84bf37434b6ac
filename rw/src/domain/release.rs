//! Release descriptor

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

/// The latest published release of a project, as reported upstream
///
/// Only `tag` is ever persisted; everything else is used to build the
/// notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseDescriptor {
    /// Opaque tag identifier, the sole comparison key (never empty)
    pub tag: String,

    /// Release title, if the upstream has one
    pub name: Option<String>,

    /// When the release was published
    pub published_at: Option<DateTime<Utc>>,

    /// Canonical release page
    pub url: String,
}

impl ReleaseDescriptor {
    /// Release title, falling back to the tag
    pub fn title(&self) -> &str {
        self.name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(&self.tag)
    }

    /// Publish time in the local timezone, or "unknown"
    pub fn published_display(&self) -> String {
        self.published_in(&Local)
    }

    /// Publish time rendered in the given timezone
    pub fn published_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        match self.published_at {
            Some(ts) => ts.with_timezone(tz).format("%A, %B %-d, %Y at %H:%M:%S %Z").to_string(),
            None => "unknown".to_string(),
        }
    }
}
