use super::traits::{DocumentStore, ObjectStore, StoreResult};
use crate::error::StoreError;
use crate::models::{
    ActivationCode, Inquiry, Listing, ListingPatch, Role, Tip, UserProfile, Visit, VisitSlot,
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    properties: BTreeMap<String, Listing>,
    users: BTreeMap<String, UserProfile>,
    visits: BTreeMap<String, Visit>,
    inquiries: BTreeMap<String, Inquiry>,
    tips: BTreeMap<String, Tip>,
    activation_codes: BTreeMap<String, ActivationCode>,
}

/// In-process document store.
///
/// All collections live behind one lock, so multi-document writes
/// (booking, code redemption) are atomic with respect to every other call.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn newest_first<T, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> Option<chrono::DateTime<Utc>>,
{
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `listings`; listings without an id get one.
    pub fn with_listings(listings: Vec<Listing>) -> Self {
        let mut collections = Collections::default();
        for mut listing in listings {
            if listing.id.is_empty() {
                listing.id = new_id();
            }
            collections.properties.insert(listing.id.clone(), listing);
        }
        Self {
            inner: RwLock::new(collections),
        }
    }

    /// Load listings from a JSON file holding an array of listing documents
    pub async fn from_seed_file(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let listings: Vec<Listing> =
            serde_json::from_str(&raw).context("Seed file is not a JSON array of listings")?;
        info!("📂 Seeded {} listings from {}", listings.len(), path.display());
        Ok(Self::with_listings(listings))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn listings(&self) -> StoreResult<Vec<Listing>> {
        let guard = self.inner.read().await;
        let all: Vec<Listing> = guard.properties.values().cloned().collect();
        Ok(newest_first(all, |l: &Listing| l.created_at))
    }

    async fn listing(&self, id: &str) -> StoreResult<Option<Listing>> {
        Ok(self.inner.read().await.properties.get(id).cloned())
    }

    async fn listings_by_agent(&self, agent_id: &str) -> StoreResult<Vec<Listing>> {
        let guard = self.inner.read().await;
        let owned: Vec<Listing> = guard
            .properties
            .values()
            .filter(|l| l.agent_id == agent_id)
            .cloned()
            .collect();
        Ok(newest_first(owned, |l: &Listing| l.created_at))
    }

    async fn create_listing(&self, listing: &Listing) -> StoreResult<String> {
        let id = new_id();
        let mut stored = listing.clone();
        stored.id = id.clone();
        self.inner.write().await.properties.insert(id.clone(), stored);
        debug!("created listing {}", id);
        Ok(id)
    }

    async fn update_listing(&self, id: &str, patch: &ListingPatch) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let listing = guard
            .properties
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("properties/{id}")))?;
        patch.apply(listing);
        Ok(())
    }

    async fn delete_listing(&self, id: &str) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .properties
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("properties/{id}")))
    }

    async fn increment_views(&self, id: &str) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let listing = guard
            .properties
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("properties/{id}")))?;
        listing.views += 1;
        Ok(())
    }

    async fn book_visit(
        &self,
        listing_id: &str,
        slot_id: &str,
        visit: &Visit,
    ) -> StoreResult<Visit> {
        let mut guard = self.inner.write().await;
        let listing = guard
            .properties
            .get_mut(listing_id)
            .ok_or_else(|| StoreError::NotFound(format!("properties/{listing_id}")))?;

        let position = listing
            .visit_slots
            .iter()
            .position(|s| s.id == slot_id)
            .ok_or_else(|| StoreError::Conflict(format!("slot {slot_id} is not offered")))?;
        listing.visit_slots.remove(position);

        let mut booked = visit.clone();
        booked.id = new_id();
        guard.visits.insert(booked.id.clone(), booked.clone());
        Ok(booked)
    }

    async fn add_visit_slot(&self, listing_id: &str, slot: &VisitSlot) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let listing = guard
            .properties
            .get_mut(listing_id)
            .ok_or_else(|| StoreError::NotFound(format!("properties/{listing_id}")))?;
        listing.visit_slots.push(slot.clone());
        Ok(())
    }

    async fn remove_visit_slot(&self, listing_id: &str, slot_id: &str) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let listing = guard
            .properties
            .get_mut(listing_id)
            .ok_or_else(|| StoreError::NotFound(format!("properties/{listing_id}")))?;
        let position = listing
            .visit_slots
            .iter()
            .position(|s| s.id == slot_id)
            .ok_or_else(|| StoreError::NotFound(format!("slot {slot_id}")))?;
        listing.visit_slots.remove(position);
        Ok(())
    }

    async fn user(&self, uid: &str) -> StoreResult<Option<UserProfile>> {
        Ok(self.inner.read().await.users.get(uid).cloned())
    }

    async fn put_user(&self, profile: &UserProfile) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .users
            .insert(profile.uid.clone(), profile.clone());
        Ok(())
    }

    async fn users(&self) -> StoreResult<Vec<UserProfile>> {
        let all: Vec<UserProfile> = self.inner.read().await.users.values().cloned().collect();
        Ok(newest_first(all, |u: &UserProfile| u.created_at))
    }

    async fn set_user_role(&self, uid: &str, role: Role) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let user = guard
            .users
            .get_mut(uid)
            .ok_or_else(|| StoreError::NotFound(format!("users/{uid}")))?;
        user.role = role;
        Ok(())
    }

    async fn delete_user(&self, uid: &str) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .users
            .remove(uid)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("users/{uid}")))
    }

    async fn visits(&self) -> StoreResult<Vec<Visit>> {
        let all: Vec<Visit> = self.inner.read().await.visits.values().cloned().collect();
        Ok(newest_first(all, |v: &Visit| Some(v.timestamp)))
    }

    async fn visits_for_agent(&self, agent_id: &str) -> StoreResult<Vec<Visit>> {
        let visits = self.visits().await?;
        Ok(visits.into_iter().filter(|v| v.agent_id == agent_id).collect())
    }

    async fn visits_for_client(&self, client_id: &str) -> StoreResult<Vec<Visit>> {
        let visits = self.visits().await?;
        Ok(visits.into_iter().filter(|v| v.client_id == client_id).collect())
    }

    async fn create_inquiry(&self, inquiry: &Inquiry) -> StoreResult<String> {
        let id = new_id();
        let mut stored = inquiry.clone();
        stored.id = id.clone();
        self.inner.write().await.inquiries.insert(id.clone(), stored);
        Ok(id)
    }

    async fn inquiries_for_agent(&self, agent_id: &str) -> StoreResult<Vec<Inquiry>> {
        let guard = self.inner.read().await;
        let mine: Vec<Inquiry> = guard
            .inquiries
            .values()
            .filter(|i| i.agent_id == agent_id)
            .cloned()
            .collect();
        Ok(newest_first(mine, |i: &Inquiry| Some(i.timestamp)))
    }

    async fn mark_inquiry_read(&self, id: &str) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let inquiry = guard
            .inquiries
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("inquiries/{id}")))?;
        inquiry.read = true;
        Ok(())
    }

    async fn tips(&self) -> StoreResult<Vec<Tip>> {
        let guard = self.inner.read().await;
        let published: Vec<Tip> = guard.tips.values().filter(|t| t.published).cloned().collect();
        Ok(newest_first(published, |t: &Tip| Some(t.created_at)))
    }

    async fn create_tip(&self, tip: &Tip) -> StoreResult<String> {
        let id = new_id();
        let mut stored = tip.clone();
        stored.id = id.clone();
        self.inner.write().await.tips.insert(id.clone(), stored);
        Ok(id)
    }

    async fn delete_tip(&self, id: &str) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .tips
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("tips/{id}")))
    }

    async fn create_activation_code(&self, code: &ActivationCode) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        if guard.activation_codes.contains_key(&code.code) {
            return Err(StoreError::Conflict(format!("code {} already exists", code.code)));
        }
        guard.activation_codes.insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn redeem_activation_code(&self, code: &str, uid: &str) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let collections = &mut *guard;

        let entry = collections
            .activation_codes
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound(format!("activation_codes/{code}")))?;
        if entry.used {
            return Err(StoreError::Conflict(format!("code {code} already used")));
        }
        let user = collections
            .users
            .get_mut(uid)
            .ok_or_else(|| StoreError::NotFound(format!("users/{uid}")))?;

        entry.used = true;
        entry.used_by = Some(uid.to_string());
        entry.used_at = Some(Utc::now());
        user.role = Role::Agent;
        Ok(())
    }
}

/// In-process object store; URLs use a `memory://` scheme
#[derive(Default)]
pub struct MemoryObjects {
    blobs: Mutex<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.lock().await.get(path).map(|(_, bytes)| bytes.clone())
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjects {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> StoreResult<String> {
        self.blobs
            .lock()
            .await
            .insert(path.to_string(), (content_type.to_string(), bytes));
        Ok(format!("memory://{path}"))
    }
}
