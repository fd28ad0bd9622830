use super::{storage_name, Confirmation};
use crate::auth::{Identity, Session};
use crate::error::{ServiceError, StoreError};
use crate::models::{
    Antiquity, Availability, Currency, Listing, ListingPatch, Operation, Role, VisitSlot,
};
use crate::search::{filter_listings, FilterCriteria};
use crate::store::{DocumentStore, ObjectStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An image picked in the listing form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// The agent's "new listing" form
#[derive(Debug, Clone, Default)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub operation: Option<Operation>,
    pub price: Option<f64>,
    pub currency: Currency,
    pub category: String,
    pub location: String,
    pub address: String,
    pub area: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub floor: Option<String>,
    pub elevator: Option<bool>,
    pub parking: Option<bool>,
    pub duplex: Option<bool>,
    pub furnished: Option<bool>,
    pub pool: Option<bool>,
    pub gym: Option<bool>,
    pub security: Option<bool>,
    pub mortgage_eligible: Option<bool>,
    pub exclusive: Option<bool>,
    pub antiquity: Option<Antiquity>,
    pub visit_slots: Vec<VisitSlot>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ListingDraft {
    /// Names of required fields that are missing, in form order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.operation.is_none() {
            missing.push("operation");
        }
        if !self.price.is_some_and(|p| p.is_finite() && p > 0.0) {
            missing.push("price");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        if self.location.trim().is_empty() {
            missing.push("location");
        }
        missing
    }

    fn into_listing(self, agent: &Identity, images: Vec<String>) -> Listing {
        let visit_slots = self
            .visit_slots
            .into_iter()
            .map(|mut slot| {
                if slot.id.is_empty() {
                    slot.id = Uuid::new_v4().simple().to_string();
                }
                slot
            })
            .collect();

        Listing {
            id: String::new(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            operation: self.operation,
            price: self.price.unwrap_or(0.0),
            currency: self.currency,
            category: self.category.trim().to_string(),
            location: self.location.trim().to_string(),
            address: self.address.trim().to_string(),
            area: self.area,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            floor: self.floor,
            elevator: self.elevator,
            parking: self.parking,
            duplex: self.duplex,
            furnished: self.furnished,
            pool: self.pool,
            gym: self.gym,
            security: self.security,
            mortgage_eligible: self.mortgage_eligible,
            exclusive: self.exclusive,
            antiquity: self.antiquity,
            status: Some(Availability::Available),
            images,
            created_at: Some(Utc::now()),
            agent_id: agent.uid.clone(),
            agent_name: agent.display_name.clone(),
            views: 0,
            is_promoted: false,
            visit_slots,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Listing feed, detail page and the agent dashboard
pub struct ListingService {
    store: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
}

impl ListingService {
    pub fn new(store: Arc<dyn DocumentStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { store, objects }
    }

    /// Fetch everything once and run the search pipeline over it
    pub async fn search(&self, criteria: &FilterCriteria) -> Result<Vec<Listing>, ServiceError> {
        let all = self.store.listings().await.inspect_err(|e| {
            warn!("Failed to load listings: {}", e);
        })?;
        let results = filter_listings(&all, criteria);
        debug!("Search matched {} of {} listings", results.len(), all.len());
        Ok(results)
    }

    /// Detail page load: read the listing and bump its view counter
    pub async fn open_detail(&self, id: &str) -> Result<Listing, ServiceError> {
        let mut listing = self
            .store
            .listing(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("properties/{id}")))?;

        match self.store.increment_views(id).await {
            Ok(()) => listing.views += 1,
            Err(e) => warn!("Could not count view on {}: {}", id, e),
        }
        Ok(listing)
    }

    pub async fn agent_listings(&self, session: &Session) -> Result<Vec<Listing>, ServiceError> {
        let agent = session.require_role(&[Role::Agent, Role::Superadmin])?;
        Ok(self.store.listings_by_agent(&agent.uid).await?)
    }

    pub async fn create_listing(
        &self,
        session: &Session,
        draft: ListingDraft,
        images: Vec<ImageUpload>,
    ) -> Result<Listing, ServiceError> {
        let agent = session.require_role(&[Role::Agent, Role::Superadmin])?;
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return Err(ServiceError::Validation(missing));
        }

        let stamp = Utc::now().timestamp_millis();
        let mut urls = Vec::with_capacity(images.len());
        for (index, image) in images.into_iter().enumerate() {
            let path = format!(
                "properties/{}/{}_{}_{}",
                agent.uid,
                stamp,
                index,
                storage_name(&image.file_name)
            );
            let url = self
                .objects
                .upload(&path, image.bytes, &image.content_type)
                .await
                .inspect_err(|e| warn!("Image upload {} failed: {}", path, e))?;
            urls.push(url);
        }

        let mut listing = draft.into_listing(&agent, urls);
        listing.id = self.store.create_listing(&listing).await?;
        info!(
            "🏠 {} published \"{}\" ({} images)",
            agent.email,
            listing.title,
            listing.images.len()
        );
        Ok(listing)
    }

    pub async fn update_listing(
        &self,
        session: &Session,
        id: &str,
        patch: &ListingPatch,
    ) -> Result<(), ServiceError> {
        self.owned(session, id).await?;
        if patch.visit_slots.is_some() {
            return Err(ServiceError::Forbidden("visit slots are changed one at a time"));
        }
        if patch.is_promoted.is_some() && !session.require()?.is_superadmin() {
            return Err(ServiceError::Forbidden("only superadmins promote listings"));
        }
        if patch.is_empty() {
            return Ok(());
        }
        self.store.update_listing(id, patch).await?;
        Ok(())
    }

    /// Toggle between available / unavailable / draft
    pub async fn set_status(
        &self,
        session: &Session,
        id: &str,
        status: Availability,
    ) -> Result<(), ServiceError> {
        self.owned(session, id).await?;
        info!("Listing {} is now {}", id, status.as_str());
        self.store
            .update_listing(id, &ListingPatch::status(status))
            .await?;
        Ok(())
    }

    pub async fn add_visit_slot(
        &self,
        session: &Session,
        id: &str,
        date: &str,
        time: &str,
    ) -> Result<VisitSlot, ServiceError> {
        let mut missing = Vec::new();
        if date.trim().is_empty() {
            missing.push("date");
        }
        if time.trim().is_empty() {
            missing.push("time");
        }
        if !missing.is_empty() {
            return Err(ServiceError::Validation(missing));
        }

        self.owned(session, id).await?;
        let slot = VisitSlot {
            id: Uuid::new_v4().simple().to_string(),
            date: date.trim().to_string(),
            time: time.trim().to_string(),
        };
        self.store.add_visit_slot(id, &slot).await?;
        Ok(slot)
    }

    pub async fn remove_visit_slot(
        &self,
        session: &Session,
        id: &str,
        slot_id: &str,
    ) -> Result<(), ServiceError> {
        self.owned(session, id).await?;
        match self.store.remove_visit_slot(id, slot_id).await {
            Err(StoreError::NotFound(_)) => Err(ServiceError::NotFound(format!("slot {slot_id}"))),
            other => Ok(other?),
        }
    }

    pub async fn delete_listing(
        &self,
        session: &Session,
        id: &str,
        confirmation: &Confirmation,
    ) -> Result<(), ServiceError> {
        confirmation.check(id)?;
        let listing = self.owned(session, id).await?;
        self.store.delete_listing(id).await?;
        info!("🗑️ Deleted listing {} (\"{}\")", id, listing.title);
        Ok(())
    }

    pub async fn set_promoted(
        &self,
        session: &Session,
        id: &str,
        promoted: bool,
    ) -> Result<(), ServiceError> {
        session.require_role(&[Role::Superadmin])?;
        self.store
            .update_listing(id, &ListingPatch::promoted(promoted))
            .await
            .map_err(|e| match e {
                StoreError::NotFound(what) => ServiceError::NotFound(what),
                other => other.into(),
            })
    }

    /// The listing, if the signed-in user owns it or is a superadmin
    async fn owned(&self, session: &Session, id: &str) -> Result<Listing, ServiceError> {
        let who = session.require()?;
        let listing = self
            .store
            .listing(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("properties/{id}")))?;
        if listing.agent_id != who.uid && !who.is_superadmin() {
            return Err(ServiceError::Forbidden("listing belongs to another agent"));
        }
        Ok(listing)
    }
}
