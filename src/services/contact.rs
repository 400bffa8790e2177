//! Contact service
//!
//! Lead capture from the public contact and raffle forms, plus the admin
//! contact list.

use std::sync::Arc;

use anyhow::Context;

use crate::db::query::ListPlan;
use crate::db::repositories::ContactRepository;
use crate::models::{Contact, ContactForm, ContactListQuery, CreateContactInput, PagedResult, RaffleForm};
use crate::services::email::EmailService;

/// Error types for contact service operations
#[derive(Debug, thiserror::Error)]
pub enum ContactServiceError {
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// What happened to a submission
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Stored(Contact),
    /// Honeypot was filled. Nothing was written.
    Discarded,
}

pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
    email: Option<Arc<EmailService>>,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactRepository>, email: Option<Arc<EmailService>>) -> Self {
        Self { repo, email }
    }

    pub async fn submit_contact(&self, form: ContactForm) -> Result<Submission, ContactServiceError> {
        if form.is_spam() {
            tracing::info!("Discarded contact submission with filled honeypot");
            return Ok(Submission::Discarded);
        }
        self.store(form.into_input()).await
    }

    pub async fn submit_raffle(&self, form: RaffleForm) -> Result<Submission, ContactServiceError> {
        if form.is_spam() {
            tracing::info!("Discarded raffle signup with filled honeypot");
            return Ok(Submission::Discarded);
        }
        self.store(form.into_input()).await
    }

    pub async fn list(&self, query: &ContactListQuery) -> Result<PagedResult<Contact>, ContactServiceError> {
        let plan = ListPlan::for_contacts(query);
        let page = self.repo.list(&plan).await.context("Failed to list contacts")?;
        Ok(page)
    }

    async fn store(&self, input: CreateContactInput) -> Result<Submission, ContactServiceError> {
        let contact = self.repo.create(&input).await.context("Failed to store contact")?;
        tracing::info!("Stored {} lead {}", contact.source, contact.id);
        self.notify(&contact);
        Ok(Submission::Stored(contact))
    }

    /// Fire-and-forget notification. Failures are logged only.
    fn notify(&self, contact: &Contact) {
        let Some(email) = self.email.clone() else {
            return;
        };
        let contact = contact.clone();
        tokio::spawn(async move {
            if let Err(e) = email.notify_new_contact(&contact).await {
                tracing::warn!("Failed to send notification for lead {}: {:#}", contact.id, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;
    use crate::db::repositories::SqlxContactRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::ContactSource;

    async fn setup() -> ContactService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ContactService::new(SqlxContactRepository::boxed(pool), None)
    }

    async fn stored_count(service: &ContactService) -> i64 {
        service.list(&ContactListQuery::default()).await.unwrap().total
    }

    fn form(website: Option<&str>) -> ContactForm {
        ContactForm {
            name: "Eva".to_string(),
            email: "eva@example.com".to_string(),
            message: Some("Hola".to_string()),
            website: website.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_contact_is_stored() {
        let service = setup().await;
        let result = service.submit_contact(form(None)).await.unwrap();

        let Submission::Stored(contact) = result else {
            panic!("Expected a stored contact");
        };
        assert_eq!(contact.source, ContactSource::Contact);
        assert_eq!(stored_count(&service).await, 1);
    }

    #[tokio::test]
    async fn test_honeypot_persists_nothing() {
        let service = setup().await;
        let result = service.submit_contact(form(Some("http://spam.example"))).await.unwrap();
        assert_eq!(result, Submission::Discarded);

        let raffle = RaffleForm {
            name: "Bot".to_string(),
            email: "bot@example.com".to_string(),
            phone: None,
            website: Some("x".to_string()),
        };
        assert_eq!(service.submit_raffle(raffle).await.unwrap(), Submission::Discarded);
        assert_eq!(stored_count(&service).await, 0);
    }

    #[tokio::test]
    async fn test_raffle_signup_is_a_raffle_contact() {
        let service = setup().await;
        let raffle = RaffleForm {
            name: "Leo".to_string(),
            email: "leo@example.com".to_string(),
            phone: Some("555".to_string()),
            website: None,
        };
        service.submit_raffle(raffle).await.unwrap();

        let page = service.list(&ContactListQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.rows[0].source, ContactSource::Raffle);
    }

    #[tokio::test]
    async fn test_failed_notification_does_not_fail_submission() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let email = EmailService::new(MailConfig {
            enabled: true,
            smtp_host: "smtp.invalid".to_string(),
            from: "web@example.com".to_string(),
            notify_to: "not an address".to_string(),
            ..Default::default()
        });
        let service = ContactService::new(
            SqlxContactRepository::boxed(pool),
            Some(Arc::new(email)),
        );

        let result = service.submit_contact(form(None)).await.unwrap();
        assert!(matches!(result, Submission::Stored(_)));
    }
}
