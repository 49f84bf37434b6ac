//! SMTP email notifier
//!
//! Sender and recipient are the configured mail account unless a separate
//! recipient is configured.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::{EmailTemplates, Notifier, NotifyError};
use crate::config::{SmtpConfig, SmtpCredentials, TlsMode};
use crate::domain::{ReleaseDescriptor, TrackedProject};

/// Notifier that submits email through an authenticated mail relay
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    timeout: Duration,
    templates: EmailTemplates,
}

impl SmtpNotifier {
    /// Create a notifier; no connection is made until the first send
    pub fn new(config: &SmtpConfig, credentials: SmtpCredentials) -> Result<Self, NotifyError> {
        debug!(host = %config.host, port = config.port, tls = %config.tls, "SmtpNotifier::new: called");
        let from = parse_mailbox(&credentials.username)?;
        let to = match &config.recipient {
            Some(recipient) => parse_mailbox(recipient)?,
            None => from.clone(),
        };

        Ok(Self {
            transport: build_transport(config, credentials)?,
            from,
            to,
            timeout: config.timeout(),
            templates: EmailTemplates::new()?,
        })
    }

    pub fn recipient(&self) -> &Mailbox {
        &self.to
    }

    fn build_message(&self, project: &TrackedProject, release: &ReleaseDescriptor) -> Result<Message, NotifyError> {
        let email = self.templates.render(project, release)?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))?;
        Ok(message)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, project: &TrackedProject, release: &ReleaseDescriptor) -> Result<(), NotifyError> {
        debug!(project = %project.slug(), tag = %release.tag, to = %self.to, "notify: called");
        let message = self.build_message(project, release)?;
        let response = self.transport.send(message).await.map_err(|e| {
            if is_timed_out(&e) {
                NotifyError::Timeout(self.timeout)
            } else {
                e.into()
            }
        })?;
        debug!(code = %response.code(), "notify: accepted by relay");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse()
        .map_err(|e| NotifyError::Message(format!("invalid address '{}': {}", address, e)))
}

/// Whether an io `TimedOut` appears anywhere in the error chain
fn is_timed_out(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::TimedOut)
        {
            return true;
        }
        current = e.source();
    }
    false
}

fn build_transport(
    config: &SmtpConfig,
    credentials: SmtpCredentials,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
    let tls = match config.tls {
        TlsMode::Disabled => Tls::None,
        mode => {
            let parameters = TlsParameters::builder(config.host.clone())
                .dangerous_accept_invalid_certs(config.accept_invalid_certs)
                .build()
                .map_err(|e| NotifyError::Transport(format!("TLS setup failed: {}", e)))?;
            if mode == TlsMode::Implicit {
                Tls::Wrapper(parameters)
            } else {
                Tls::Required(parameters)
            }
        }
    };

    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        .port(config.port)
        .tls(tls)
        .credentials(Credentials::new(credentials.username, credentials.password))
        .timeout(Some(config.timeout()))
        .build())
}
