//! Outbound mail dispatch for the contact form.

use crate::config::SmtpConfig;
use crate::error::FolioError;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::path::Path;
use tracing::error;

const NAME_PLACEHOLDER: &str = "{{fullName}}";

/// Transport seam: the handlers only ever see this interface, so tests can
/// substitute a capturing implementation.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), FolioError>;
}

/// SMTP relay client. Transient relay failures are retried with exponential
/// backoff before surfacing as an internal error.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> Result<Self, FolioError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)?.port(cfg.port);
        if !cfg.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                cfg.username.clone(),
                cfg.password.clone(),
            ));
        }
        Ok(Self {
            transport: builder.build(),
            from: cfg.from.parse()?,
        })
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), FolioError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?;

        (|| async {
            let outcome = self.transport.send(message.clone()).await;
            if let Err(e) = &outcome
                && e.is_transient()
            {
                error!("mail relay transient failure (will retry): {}", e);
            }
            outcome
        })
        .retry(ExponentialBuilder::default().with_max_times(2))
        .when(|e| e.is_transient())
        .await?;

        Ok(())
    }
}

/// Load the contact-reply HTML template from disk.
pub async fn load_template(path: &Path) -> Result<String, FolioError> {
    Ok(tokio::fs::read_to_string(path).await?)
}

/// Substitute the recipient display name into the template.
pub fn render_template(template: &str, full_name: &str) -> String {
    template.replace(NAME_PLACEHOLDER, full_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_every_occurrence() {
        let template = "<p>Hi {{fullName}}!</p><p>Bye {{fullName}}.</p>";
        let rendered = render_template(template, "Ada");
        assert_eq!(rendered, "<p>Hi Ada!</p><p>Bye Ada.</p>");
    }

    #[test]
    fn render_without_placeholder_is_identity() {
        let template = "<p>static</p>";
        assert_eq!(render_template(template, "Ada"), template);
    }

    #[tokio::test]
    async fn missing_template_is_an_io_error() {
        let err = load_template(Path::new("/nonexistent/contact.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::Io(_)));
    }
}
