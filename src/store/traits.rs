use crate::error::StoreError;
use crate::models::{
    ActivationCode, Inquiry, Listing, ListingPatch, Role, Tip, UserProfile, Visit, VisitSlot,
};
use async_trait::async_trait;

pub type StoreResult<T> = Result<T, StoreError>;

/// Narrow access to the document database.
///
/// One method per query shape the app actually issues, so services can be
/// exercised against [`MemoryStore`](super::MemoryStore) and run in
/// production against [`RestStore`](super::RestStore).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every listing regardless of status, newest first
    async fn listings(&self) -> StoreResult<Vec<Listing>>;

    async fn listing(&self, id: &str) -> StoreResult<Option<Listing>>;

    /// Listings owned by one agent, newest first
    async fn listings_by_agent(&self, agent_id: &str) -> StoreResult<Vec<Listing>>;

    /// Insert a listing, returning the id the store assigned
    async fn create_listing(&self, listing: &Listing) -> StoreResult<String>;

    async fn update_listing(&self, id: &str, patch: &ListingPatch) -> StoreResult<()>;

    async fn delete_listing(&self, id: &str) -> StoreResult<()>;

    async fn increment_views(&self, id: &str) -> StoreResult<()>;

    /// Create `visit` and remove `slot_id` from the listing's offered slots as
    /// one write. Fails with [`StoreError::Conflict`] when the slot is no
    /// longer offered; in that case nothing is written.
    async fn book_visit(&self, listing_id: &str, slot_id: &str, visit: &Visit)
        -> StoreResult<Visit>;

    /// Append `slot` to the listing's offered slots as one write, leaving
    /// slots booked in the meantime untouched
    async fn add_visit_slot(&self, listing_id: &str, slot: &VisitSlot) -> StoreResult<()>;

    /// Withdraw one offered slot as one write. [`StoreError::NotFound`] when
    /// the slot is no longer offered.
    async fn remove_visit_slot(&self, listing_id: &str, slot_id: &str) -> StoreResult<()>;

    async fn user(&self, uid: &str) -> StoreResult<Option<UserProfile>>;

    /// Create or replace the profile keyed by `profile.uid`
    async fn put_user(&self, profile: &UserProfile) -> StoreResult<()>;

    async fn users(&self) -> StoreResult<Vec<UserProfile>>;

    async fn set_user_role(&self, uid: &str, role: Role) -> StoreResult<()>;

    async fn delete_user(&self, uid: &str) -> StoreResult<()>;

    async fn visits(&self) -> StoreResult<Vec<Visit>>;

    async fn visits_for_agent(&self, agent_id: &str) -> StoreResult<Vec<Visit>>;

    async fn visits_for_client(&self, client_id: &str) -> StoreResult<Vec<Visit>>;

    async fn create_inquiry(&self, inquiry: &Inquiry) -> StoreResult<String>;

    async fn inquiries_for_agent(&self, agent_id: &str) -> StoreResult<Vec<Inquiry>>;

    async fn mark_inquiry_read(&self, id: &str) -> StoreResult<()>;

    /// Published tips, newest first
    async fn tips(&self) -> StoreResult<Vec<Tip>>;

    async fn create_tip(&self, tip: &Tip) -> StoreResult<String>;

    async fn delete_tip(&self, id: &str) -> StoreResult<()>;

    async fn create_activation_code(&self, code: &ActivationCode) -> StoreResult<()>;

    /// Mark `code` used by `uid` and promote that user to agent in one batch.
    /// [`StoreError::NotFound`] for unknown codes, [`StoreError::Conflict`]
    /// for codes already used.
    async fn redeem_activation_code(&self, code: &str, uid: &str) -> StoreResult<()>;
}

/// Binary blob storage for listing images
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `path` and return a durable download URL
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<String>;
}
