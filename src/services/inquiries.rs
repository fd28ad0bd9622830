use crate::auth::types::valid_email;
use crate::auth::Session;
use crate::error::{AuthError, ServiceError};
use crate::models::{Inquiry, Role};
use crate::store::DocumentStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Contact form on the listing detail page
#[derive(Debug, Clone, Default)]
pub struct InquiryForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

pub struct InquiryService {
    store: Arc<dyn DocumentStore>,
}

impl InquiryService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Anyone can write to the agent of a listing, signed in or not
    pub async fn send(&self, listing_id: &str, form: InquiryForm) -> Result<Inquiry, ServiceError> {
        let mut missing = Vec::new();
        if form.name.trim().is_empty() {
            missing.push("name");
        }
        if form.email.trim().is_empty() {
            missing.push("email");
        }
        if form.message.trim().is_empty() {
            missing.push("message");
        }
        if !missing.is_empty() {
            return Err(ServiceError::Validation(missing));
        }
        if !valid_email(&form.email) {
            return Err(AuthError::InvalidEmail.into());
        }

        let listing = self
            .store
            .listing(listing_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("properties/{listing_id}")))?;

        let mut inquiry = Inquiry {
            id: String::new(),
            property_id: listing.id,
            property_title: listing.title,
            agent_id: listing.agent_id,
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone.trim().to_string(),
            message: form.message.trim().to_string(),
            timestamp: Utc::now(),
            read: false,
        };
        inquiry.id = self.store.create_inquiry(&inquiry).await?;
        info!("✉️ Inquiry for \"{}\" from {}", inquiry.property_title, inquiry.email);
        Ok(inquiry)
    }

    pub async fn inbox(&self, session: &Session) -> Result<Vec<Inquiry>, ServiceError> {
        let agent = session.require_role(&[Role::Agent, Role::Superadmin])?;
        Ok(self.store.inquiries_for_agent(&agent.uid).await?)
    }

    pub async fn unread_count(&self, session: &Session) -> Result<usize, ServiceError> {
        Ok(self.inbox(session).await?.iter().filter(|i| !i.read).count())
    }

    pub async fn mark_read(&self, session: &Session, id: &str) -> Result<(), ServiceError> {
        let inbox = self.inbox(session).await?;
        if !inbox.iter().any(|i| i.id == id) {
            return Err(ServiceError::NotFound(format!("inquiries/{id}")));
        }
        self.store.mark_inquiry_read(id).await?;
        Ok(())
    }
}
