//! Notification error types

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur sending a notification
///
/// Authentication, recipient rejection and transport failures stay
/// distinguishable so logs say which one happened.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Message rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid message: {0}")]
    Message(String),

    #[error("Template error: {0}")]
    Template(String),
}

impl NotifyError {
    /// Short label for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyError::Authentication(_) => "authentication",
            NotifyError::Rejected { .. } => "rejected",
            NotifyError::Transport(_) => "transport",
            NotifyError::Timeout(_) => "timeout",
            NotifyError::Message(_) => "message",
            NotifyError::Template(_) => "template",
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, NotifyError::Authentication(_))
    }

    /// Classify a relay failure by its SMTP reply code
    ///
    /// 530/534/535 are authentication failures, any other 5xx is a
    /// permanent rejection, everything else (4xx, no reply) is transport.
    pub fn from_reply(code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            Some("530" | "534" | "535") => NotifyError::Authentication(message),
            Some(code) if code.starts_with('5') => NotifyError::Rejected {
                code: code.to_string(),
                message,
            },
            _ => NotifyError::Transport(message),
        }
    }
}

impl From<lettre::transport::smtp::Error> for NotifyError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        let code = err.status().map(|c| c.to_string());
        NotifyError::from_reply(code.as_deref(), err.to_string())
    }
}

impl From<lettre::error::Error> for NotifyError {
    fn from(err: lettre::error::Error) -> Self {
        NotifyError::Message(err.to_string())
    }
}

impl From<handlebars::RenderError> for NotifyError {
    fn from(err: handlebars::RenderError) -> Self {
        NotifyError::Template(err.to_string())
    }
}
