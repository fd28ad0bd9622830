mod common;

use async_trait::async_trait;
use chrono::Utc;
use common::{listing_with_slots, Harness};
use inmo_market::error::{BookingError, ServiceError};
use inmo_market::models::{
    ActivationCode, Inquiry, Listing, ListingPatch, Role, Tip, UserProfile, Visit, VisitSlot,
    VisitStatus,
};
use inmo_market::services::{BookingService, ListingService};
use inmo_market::store::{DocumentStore, MemoryStore, StoreResult};
use std::sync::{Arc, Mutex};

fn harness_with_slots(slots: &[(&str, &str, &str)]) -> Harness {
    Harness::with_listings(vec![listing_with_slots("cieneguilla", "agent-1", slots)])
}

#[tokio::test]
async fn test_booking_the_last_slot_empties_the_listing() {
    let h = harness_with_slots(&[("s1", "2026-10-20", "10:00")]);
    let client = h.client("ana@correo.pe", "Ana Torres").await;
    let booking = BookingService::new(h.store());

    let visit = booking.book(&client, "cieneguilla", Some("s1")).await.unwrap();
    assert_eq!(visit.property_id, "cieneguilla");
    assert_eq!(visit.agent_id, "agent-1");
    assert_eq!(visit.client_name, "Ana Torres");
    assert_eq!(visit.client_email, "ana@correo.pe");
    assert_eq!(visit.client_phone, "987654321");
    assert_eq!(visit.visit_date, "2026-10-20");
    assert_eq!(visit.visit_time, "10:00");
    assert_eq!(visit.status, VisitStatus::Pending);
    assert!(!visit.id.is_empty());

    let listing = h.store.listing("cieneguilla").await.unwrap().unwrap();
    assert!(listing.visit_slots.is_empty());
}

#[tokio::test]
async fn test_only_the_booked_slot_is_removed() {
    let h = harness_with_slots(&[("s1", "2026-10-20", "10:00"), ("s2", "2026-10-21", "16:30")]);
    let client = h.client("ana@correo.pe", "Ana Torres").await;
    let booking = BookingService::new(h.store());

    booking.book(&client, "cieneguilla", Some("s1")).await.unwrap();

    let listing = h.store.listing("cieneguilla").await.unwrap().unwrap();
    let remaining: Vec<&str> = listing.visit_slots.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(remaining, vec!["s2"]);
}

#[tokio::test]
async fn test_second_booking_of_same_slot_fails_without_duplicate_visit() {
    let h = harness_with_slots(&[("s1", "2026-10-20", "10:00")]);
    let first = h.client("ana@correo.pe", "Ana Torres").await;
    let second = h.client("luis@correo.pe", "Luis Paredes").await;
    let booking = BookingService::new(h.store());

    booking.book(&first, "cieneguilla", Some("s1")).await.unwrap();
    let err = booking.book(&second, "cieneguilla", Some("s1")).await.unwrap_err();

    assert!(matches!(err, BookingError::SlotUnavailable));
    assert!(!err.is_retryable());
    assert_eq!(h.store.visits().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_of_one_slot_produce_one_visit() {
    let h = harness_with_slots(&[("s1", "2026-10-20", "10:00")]);
    let ana = h.client("ana@correo.pe", "Ana Torres").await;
    let luis = h.client("luis@correo.pe", "Luis Paredes").await;
    let booking = BookingService::new(h.store());

    let (a, b) = tokio::join!(
        booking.book(&ana, "cieneguilla", Some("s1")),
        booking.book(&luis, "cieneguilla", Some("s1")),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(BookingError::SlotUnavailable)));

    assert_eq!(h.store.visits().await.unwrap().len(), 1);
    let listing = h.store.listing("cieneguilla").await.unwrap().unwrap();
    assert!(listing.visit_slots.is_empty());
}

#[tokio::test]
async fn test_booking_requires_a_signed_in_user() {
    let h = harness_with_slots(&[("s1", "2026-10-20", "10:00")]);
    let booking = BookingService::new(h.store());

    let err = booking.book(&h.session(), "cieneguilla", Some("s1")).await.unwrap_err();
    assert!(matches!(err, BookingError::NotAuthenticated));

    let listing = h.store.listing("cieneguilla").await.unwrap().unwrap();
    assert_eq!(listing.visit_slots.len(), 1);
}

#[tokio::test]
async fn test_booking_requires_a_slot() {
    let h = harness_with_slots(&[("s1", "2026-10-20", "10:00")]);
    let client = h.client("ana@correo.pe", "Ana Torres").await;
    let booking = BookingService::new(h.store());

    for slot in [None, Some(""), Some("   ")] {
        let err = booking.book(&client, "cieneguilla", slot).await.unwrap_err();
        assert!(matches!(err, BookingError::NoSlotSelected));
    }
    assert!(h.store.visits().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_slot_or_listing_is_unavailable() {
    let h = harness_with_slots(&[("s1", "2026-10-20", "10:00")]);
    let client = h.client("ana@correo.pe", "Ana Torres").await;
    let booking = BookingService::new(h.store());

    let err = booking.book(&client, "cieneguilla", Some("nope")).await.unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable));
    let err = booking.book(&client, "missing", Some("s1")).await.unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable));
}

#[tokio::test]
async fn test_agent_agenda_and_client_visits() {
    let h = Harness::new();
    let agent = h.agent("lucia@inmo.pe").await;
    let agent_uid = agent.current().unwrap().uid;
    h.store
        .create_listing(&listing_with_slots("", &agent_uid, &[("s1", "2026-10-20", "10:00")]))
        .await
        .unwrap();
    let listing_id = h.store.listings_by_agent(&agent_uid).await.unwrap()[0].id.clone();

    let client = h.client("ana@correo.pe", "Ana Torres").await;
    let booking = BookingService::new(h.store());
    booking.book(&client, &listing_id, Some("s1")).await.unwrap();

    let agenda = booking.agent_agenda(&agent).await.unwrap();
    assert_eq!(agenda.len(), 1);
    assert_eq!(agenda[0].client_name, "Ana Torres");

    let mine = booking.my_visits(&client).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert!(booking.agent_agenda(&client).await.is_err());
}

// ---------------------------------------------------------------------------
// Slot edits racing a booking
// ---------------------------------------------------------------------------

/// Memory store that books one slot right after the next listing read, so a
/// caller working from that read sees a slot that is already gone.
struct BookedAfterRead {
    inner: Arc<MemoryStore>,
    pending: Mutex<Option<(String, Visit)>>,
}

impl BookedAfterRead {
    fn new(inner: Arc<MemoryStore>, slot_id: &str, visit: Visit) -> Self {
        Self {
            inner,
            pending: Mutex::new(Some((slot_id.to_string(), visit))),
        }
    }
}

#[async_trait]
impl DocumentStore for BookedAfterRead {
    async fn listings(&self) -> StoreResult<Vec<Listing>> {
        self.inner.listings().await
    }

    async fn listing(&self, id: &str) -> StoreResult<Option<Listing>> {
        let snapshot = self.inner.listing(id).await?;
        let pending = self.pending.lock().unwrap().take();
        if let Some((slot_id, visit)) = pending {
            self.inner.book_visit(id, &slot_id, &visit).await?;
        }
        Ok(snapshot)
    }

    async fn listings_by_agent(&self, agent_id: &str) -> StoreResult<Vec<Listing>> {
        self.inner.listings_by_agent(agent_id).await
    }

    async fn create_listing(&self, listing: &Listing) -> StoreResult<String> {
        self.inner.create_listing(listing).await
    }

    async fn update_listing(&self, id: &str, patch: &ListingPatch) -> StoreResult<()> {
        self.inner.update_listing(id, patch).await
    }

    async fn delete_listing(&self, id: &str) -> StoreResult<()> {
        self.inner.delete_listing(id).await
    }

    async fn increment_views(&self, id: &str) -> StoreResult<()> {
        self.inner.increment_views(id).await
    }

    async fn book_visit(&self, listing_id: &str, slot_id: &str, visit: &Visit)
        -> StoreResult<Visit> {
        self.inner.book_visit(listing_id, slot_id, visit).await
    }

    async fn add_visit_slot(&self, listing_id: &str, slot: &VisitSlot) -> StoreResult<()> {
        self.inner.add_visit_slot(listing_id, slot).await
    }

    async fn remove_visit_slot(&self, listing_id: &str, slot_id: &str) -> StoreResult<()> {
        self.inner.remove_visit_slot(listing_id, slot_id).await
    }

    async fn user(&self, uid: &str) -> StoreResult<Option<UserProfile>> {
        self.inner.user(uid).await
    }

    async fn put_user(&self, profile: &UserProfile) -> StoreResult<()> {
        self.inner.put_user(profile).await
    }

    async fn users(&self) -> StoreResult<Vec<UserProfile>> {
        self.inner.users().await
    }

    async fn set_user_role(&self, uid: &str, role: Role) -> StoreResult<()> {
        self.inner.set_user_role(uid, role).await
    }

    async fn delete_user(&self, uid: &str) -> StoreResult<()> {
        self.inner.delete_user(uid).await
    }

    async fn visits(&self) -> StoreResult<Vec<Visit>> {
        self.inner.visits().await
    }

    async fn visits_for_agent(&self, agent_id: &str) -> StoreResult<Vec<Visit>> {
        self.inner.visits_for_agent(agent_id).await
    }

    async fn visits_for_client(&self, client_id: &str) -> StoreResult<Vec<Visit>> {
        self.inner.visits_for_client(client_id).await
    }

    async fn create_inquiry(&self, inquiry: &Inquiry) -> StoreResult<String> {
        self.inner.create_inquiry(inquiry).await
    }

    async fn inquiries_for_agent(&self, agent_id: &str) -> StoreResult<Vec<Inquiry>> {
        self.inner.inquiries_for_agent(agent_id).await
    }

    async fn mark_inquiry_read(&self, id: &str) -> StoreResult<()> {
        self.inner.mark_inquiry_read(id).await
    }

    async fn tips(&self) -> StoreResult<Vec<Tip>> {
        self.inner.tips().await
    }

    async fn create_tip(&self, tip: &Tip) -> StoreResult<String> {
        self.inner.create_tip(tip).await
    }

    async fn delete_tip(&self, id: &str) -> StoreResult<()> {
        self.inner.delete_tip(id).await
    }

    async fn create_activation_code(&self, code: &ActivationCode) -> StoreResult<()> {
        self.inner.create_activation_code(code).await
    }

    async fn redeem_activation_code(&self, code: &str, uid: &str) -> StoreResult<()> {
        self.inner.redeem_activation_code(code, uid).await
    }
}

fn visit_for(slot: &VisitSlot) -> Visit {
    Visit {
        id: String::new(),
        property_id: "cieneguilla".to_string(),
        property_title: "Casa de campo en Cieneguilla".to_string(),
        agent_id: "agent-1".to_string(),
        client_id: "client-9".to_string(),
        client_name: "Rosa Quispe".to_string(),
        client_phone: "912345678".to_string(),
        client_email: "rosa@correo.pe".to_string(),
        visit_date: slot.date.clone(),
        visit_time: slot.time.clone(),
        status: VisitStatus::Pending,
        timestamp: Utc::now(),
    }
}

/// Listing service whose first listing read is followed by a booking of `s1`
async fn racing_listing_service(h: &Harness) -> ListingService {
    let s1 = h.store.listing("cieneguilla").await.unwrap().unwrap().visit_slots[0].clone();
    let store = BookedAfterRead::new(h.store.clone(), "s1", visit_for(&s1));
    ListingService::new(Arc::new(store), h.objects.clone())
}

async fn assert_s1_stays_booked(h: &Harness) {
    let listing = h.store.listing("cieneguilla").await.unwrap().unwrap();
    assert!(listing.slot("s1").is_none());
    assert_eq!(h.store.visits().await.unwrap().len(), 1);

    let client = h.client("ana@correo.pe", "Ana Torres").await;
    let err = BookingService::new(h.store())
        .book(&client, "cieneguilla", Some("s1"))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotUnavailable));
    assert_eq!(h.store.visits().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_adding_a_slot_keeps_a_booking_made_meanwhile() {
    let h = harness_with_slots(&[("s1", "2026-10-20", "10:00"), ("s2", "2026-10-21", "16:30")]);
    let admin = h.superadmin().await;
    let listings = racing_listing_service(&h).await;

    let added = listings
        .add_visit_slot(&admin, "cieneguilla", "2026-10-22", "09:00")
        .await
        .unwrap();

    let listing = h.store.listing("cieneguilla").await.unwrap().unwrap();
    let offered: Vec<&str> = listing.visit_slots.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(offered, vec!["s2", added.id.as_str()]);
    assert_s1_stays_booked(&h).await;
}

#[tokio::test]
async fn test_removing_a_slot_keeps_a_booking_made_meanwhile() {
    let h = harness_with_slots(&[("s1", "2026-10-20", "10:00"), ("s2", "2026-10-21", "16:30")]);
    let admin = h.superadmin().await;
    let listings = racing_listing_service(&h).await;

    listings
        .remove_visit_slot(&admin, "cieneguilla", "s2")
        .await
        .unwrap();

    let listing = h.store.listing("cieneguilla").await.unwrap().unwrap();
    assert!(listing.visit_slots.is_empty());
    assert_s1_stays_booked(&h).await;
}

#[tokio::test]
async fn test_slots_cannot_be_replaced_through_a_listing_patch() {
    let h = harness_with_slots(&[("s1", "2026-10-20", "10:00")]);
    let admin = h.superadmin().await;
    let listings = ListingService::new(h.store(), h.objects.clone());

    let stale = h.store.listing("cieneguilla").await.unwrap().unwrap().visit_slots;
    let err = listings
        .update_listing(&admin, "cieneguilla", &ListingPatch::slots(stale))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}
