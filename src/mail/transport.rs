use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::mail::message::OutgoingEmail;

/// The system mail transport: accepts a composed message and attempts
/// delivery, reporting success or failure. Object-safe so the application
/// can be wired with a recording double in tests.
#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<bool>;
}

/// SMTP-backed implementation.
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// Build the transport from a `smtp://` / `smtps://` url, which may carry
    /// credentials.
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::from_url(url)?.build();
        Ok(Self { transport })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<bool> {
        let envelope = Envelope::new(
            Some(email.from_email.parse::<Address>()?),
            vec![email.to.parse::<Address>()?],
        )?;

        // The message is composed by us, headers included, so it goes out raw
        let response = self
            .transport
            .send_raw(&envelope, email.formatted().as_bytes())
            .await?;

        Ok(response.is_positive())
    }
}
