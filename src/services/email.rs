//! Email service for lead notifications

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;
use crate::models::{Contact, ContactSource};

/// Sends notification emails over SMTP
pub struct EmailService {
    config: MailConfig,
}

impl EmailService {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// Build the service only when notifications are switched on
    pub fn from_config(config: &MailConfig) -> Option<Self> {
        config.enabled.then(|| Self::new(config.clone()))
    }

    /// Tell the configured recipient about a new lead
    pub async fn notify_new_contact(&self, contact: &Contact) -> Result<()> {
        let email = self.build_notification(contact)?;

        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(self.config.smtp_port);
        if !self.config.smtp_username.is_empty() {
            transport = transport.credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ));
        }
        let mailer = transport.build();

        mailer
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }

    fn build_notification(&self, contact: &Contact) -> Result<Message> {
        let from = if self.config.from.is_empty() {
            &self.config.smtp_username
        } else {
            &self.config.from
        };

        Message::builder()
            .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .reply_to(
                contact
                    .email
                    .parse()
                    .map_err(|e| anyhow!("Invalid reply-to address: {}", e))?,
            )
            .to(self
                .config
                .notify_to
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(notification_subject(contact))
            .header(ContentType::TEXT_PLAIN)
            .body(notification_body(contact))
            .map_err(|e| anyhow!("Failed to build email: {}", e))
    }
}

fn notification_subject(contact: &Contact) -> String {
    match contact.source {
        ContactSource::Contact => format!("Nuevo contacto: {}", contact.name),
        ContactSource::Raffle => format!("Nueva inscripción al sorteo: {}", contact.name),
    }
}

fn notification_body(contact: &Contact) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    format!(
        "Nombre: {}\nEmail: {}\nTeléfono: {}\nEmpresa: {}\nOrigen: {}\nFecha: {}\n\n{}",
        contact.name,
        contact.email,
        field(&contact.phone),
        field(&contact.company),
        contact.source,
        contact.created_at.format("%Y-%m-%d %H:%M UTC"),
        contact.message.as_deref().unwrap_or(""),
    )
}
