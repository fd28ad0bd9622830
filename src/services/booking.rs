use crate::auth::Session;
use crate::error::{BookingError, ServiceError, StoreError};
use crate::models::{Role, Visit, VisitStatus};
use crate::store::DocumentStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Visit scheduling: clients book an offered slot, agents see their agenda
pub struct BookingService {
    store: Arc<dyn DocumentStore>,
}

impl BookingService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Book `slot_id` on a listing for the signed-in user.
    ///
    /// The Visit write and the slot removal happen in one store call, so a
    /// slot that two people race for is booked exactly once; the loser gets
    /// [`BookingError::SlotUnavailable`].
    pub async fn book(
        &self,
        session: &Session,
        listing_id: &str,
        slot_id: Option<&str>,
    ) -> Result<Visit, BookingError> {
        let client = session.current().ok_or(BookingError::NotAuthenticated)?;
        let slot_id = slot_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(BookingError::NoSlotSelected)?;

        let listing = self
            .store
            .listing(listing_id)
            .await
            .map_err(|e| {
                warn!("Could not load listing {} for booking: {}", listing_id, e);
                BookingError::BookingFailed(e)
            })?
            .ok_or(BookingError::SlotUnavailable)?;
        let slot = listing
            .slot(slot_id)
            .ok_or(BookingError::SlotUnavailable)?;

        let visit = Visit {
            id: String::new(),
            property_id: listing.id.clone(),
            property_title: listing.title.clone(),
            agent_id: listing.agent_id.clone(),
            client_id: client.uid.clone(),
            client_name: client.display_name.clone(),
            client_phone: client.phone.clone(),
            client_email: client.email.clone(),
            visit_date: slot.date.clone(),
            visit_time: slot.time.clone(),
            status: VisitStatus::Pending,
            timestamp: Utc::now(),
        };

        match self.store.book_visit(listing_id, slot_id, &visit).await {
            Ok(booked) => {
                info!(
                    "📅 {} booked {} {} at \"{}\"",
                    client.email, booked.visit_date, booked.visit_time, booked.property_title
                );
                Ok(booked)
            }
            Err(StoreError::Conflict(_) | StoreError::NotFound(_)) => {
                info!("Slot {} on {} was already taken", slot_id, listing_id);
                Err(BookingError::SlotUnavailable)
            }
            Err(e) => {
                warn!("Booking on {} failed: {}", listing_id, e);
                Err(BookingError::BookingFailed(e))
            }
        }
    }

    /// Visits on the signed-in agent's listings
    pub async fn agent_agenda(&self, session: &Session) -> Result<Vec<Visit>, ServiceError> {
        let agent = session.require_role(&[Role::Agent, Role::Superadmin])?;
        Ok(self.store.visits_for_agent(&agent.uid).await?)
    }

    /// Visits the signed-in user booked
    pub async fn my_visits(&self, session: &Session) -> Result<Vec<Visit>, ServiceError> {
        let client = session.require()?;
        Ok(self.store.visits_for_client(&client.uid).await?)
    }
}
