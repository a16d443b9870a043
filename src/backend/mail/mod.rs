//! Outbound Email
//!
//! The invitation workflow sends one email per invite. Unlike live pushes, a
//! failed send is surfaced to the caller as `BackendError::Transport`.
//!
//! - `SmtpMailer` - lettre SMTP relay on the tokio executor
//! - `LogMailer` - writes the email to the log; used when SMTP is not configured

use async_trait::async_trait;
use html_escape::{encode_double_quoted_attribute, encode_text};
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::backend::error::{BackendError, BackendResult};
use crate::shared::config::SmtpConfig;

/// A rendered email ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl OutboundEmail {
    /// Project invitation with a link to the response page.
    ///
    /// Every interpolated value is HTML-escaped.
    pub fn invitation(
        to: &str,
        inviter: &str,
        project_name: &str,
        role: &str,
        link: &str,
    ) -> Self {
        Self {
            to: to.to_string(),
            subject: format!("{} invited you to {}", inviter, project_name),
            html: format!(
                "<p>{inviter} has invited you to join <strong>{project}</strong> with {role} access.</p>\
                 <p><a href=\"{link}\">View invitation</a></p>",
                inviter = encode_text(inviter),
                project = encode_text(project_name),
                role = encode_text(role),
                link = encode_double_quoted_attribute(link),
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> BackendResult<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> BackendResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| BackendError::transport(format!("Invalid SMTP relay: {}", e)))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> BackendResult<()> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(email.to.parse()?)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)?;

        self.transport.send(message).await.map_err(|e| {
            tracing::error!("[Mail] Failed to send to {}: {}", email.to, e);
            BackendError::transport("Failed to send invitation email")
        })?;
        tracing::info!("[Mail] Sent email to {}", email.to);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutboundEmail) -> BackendResult<()> {
        tracing::info!(
            "[Mail] (log only) to={} subject={:?}",
            email.to,
            email.subject
        );
        Ok(())
    }
}
