//! Shared fixtures for the integration tests.
//!
//! `Harness` wires the in-memory store, auth provider and object store
//! together the way the binary wires the real ones, and can hand out sessions
//! already signed in with a given role.

#![allow(dead_code)]

use inmo_market::auth::{MemoryAuth, Session, SignUp};
use inmo_market::models::{Listing, Role};
use inmo_market::store::{DocumentStore, MemoryObjects, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;

/// Decode a listing document the way the store would
pub fn listing(doc: Value) -> Listing {
    serde_json::from_value(doc).unwrap()
}

pub fn ids(listings: &[Listing]) -> Vec<&str> {
    listings.iter().map(|l| l.id.as_str()).collect()
}

/// A small mixed catalogue: two currencies, all three operations, one
/// promoted listing, one taken and one draft.
pub fn sample_listings() -> Vec<Listing> {
    vec![
        listing(json!({
            "id": "miraflores-depto",
            "title": "Departamento con vista al mar",
            "operationType": "venta",
            "price": 185000,
            "currency": "USD",
            "category": "departamento",
            "location": "Miraflores, Lima",
            "address": "Malecón de la Reserva 610",
            "bedrooms": 3,
            "bathrooms": 2,
            "floor": "8",
            "parking": true,
            "status": "disponible",
            "agentId": "agent-1",
            "agentName": "Lucía Rojas",
            "createdAt": "2026-09-20T10:00:00Z"
        })),
        listing(json!({
            "id": "surco-casa",
            "title": "Casa amplia en Surco",
            "operationType": "venta",
            "price": 1140000,
            "currency": "PEN",
            "category": "casa",
            "location": "Santiago de Surco, Lima",
            "bedrooms": 4,
            "bathrooms": 3,
            "parking": true,
            "duplex": true,
            "status": "disponible",
            "agentId": "agent-2",
            "agentName": "Jorge Salas",
            "isPromoted": true,
            "createdAt": "2026-08-01T09:30:00Z"
        })),
        listing(json!({
            "id": "barranco-alquiler",
            "title": "Dpto. amoblado en Barranco",
            "operationType": "alquiler",
            "price": "3800",
            "currency": "PEN",
            "category": "departamento",
            "location": "Barranco, Lima",
            "bedrooms": "1",
            "bathrooms": 1,
            "floor": "2",
            "status": "disponible",
            "agentId": "agent-1",
            "agentName": "Lucía Rojas",
            "createdAt": { "seconds": 1_790_000_000, "nanoseconds": 0 }
        })),
        listing(json!({
            "id": "lurin-terreno",
            "title": "Lote de playa",
            "operationType": "venta",
            "price": 60000,
            "currency": "USD",
            "category": "terreno",
            "location": "Lurín",
            "status": "disponible",
            "agentId": "agent-2",
            "createdAt": "2026-07-15T12:00:00Z"
        })),
        listing(json!({
            "id": "sanisidro-oficina",
            "title": "Oficina en San Isidro",
            "operationType": "anticretico",
            "price": 90000,
            "currency": "USD",
            "category": "oficina",
            "location": "San Isidro, Lima",
            "bathrooms": 1,
            "status": "tomada",
            "agentId": "agent-1",
            "createdAt": "2026-09-25T08:00:00Z"
        })),
        listing(json!({
            "id": "jesusmaria-borrador",
            "title": "Departamento en Jesús María",
            "operationType": "venta",
            "price": 95000,
            "currency": "USD",
            "category": "departamento",
            "location": "Jesús María, Lima",
            "bedrooms": 2,
            "status": "borrador",
            "agentId": "agent-1"
        })),
    ]
}

/// A listing with bookable slots owned by `agent_id`
pub fn listing_with_slots(id: &str, agent_id: &str, slots: &[(&str, &str, &str)]) -> Listing {
    let slots: Vec<Value> = slots
        .iter()
        .map(|(id, date, time)| json!({ "id": id, "date": date, "time": time }))
        .collect();
    listing(json!({
        "id": id,
        "title": "Casa de campo en Cieneguilla",
        "operationType": "venta",
        "price": 250000,
        "currency": "USD",
        "category": "casa",
        "location": "Cieneguilla",
        "status": "disponible",
        "agentId": agent_id,
        "agentName": "Lucía Rojas",
        "visitSlots": slots,
        "createdAt": "2026-10-01T00:00:00Z"
    }))
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub auth: Arc<MemoryAuth>,
    pub objects: Arc<MemoryObjects>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_listings(Vec::new())
    }

    pub fn with_listings(listings: Vec<Listing>) -> Self {
        Self {
            store: Arc::new(MemoryStore::with_listings(listings)),
            auth: Arc::new(MemoryAuth::new()),
            objects: Arc::new(MemoryObjects::new()),
        }
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    /// A fresh, signed-out session
    pub fn session(&self) -> Session {
        Session::new(self.auth.clone(), self.store.clone())
    }

    /// Register `email` as a client and sign the new session in
    pub async fn client(&self, email: &str, name: &str) -> Session {
        let session = self.session();
        session
            .sign_up(SignUp {
                email: email.to_string(),
                password: "secreto123".to_string(),
                display_name: name.to_string(),
                phone: "987654321".to_string(),
                ..SignUp::default()
            })
            .await
            .unwrap();
        session
    }

    /// Register `email`, promote the profile to `role` and refresh the session
    pub async fn signed_in_as(&self, role: Role, email: &str, name: &str) -> Session {
        let session = self.client(email, name).await;
        let uid = session.current().unwrap().uid;
        self.store.set_user_role(&uid, role).await.unwrap();
        session.refresh().await.unwrap();
        session
    }

    pub async fn agent(&self, email: &str) -> Session {
        self.signed_in_as(Role::Agent, email, "Lucía Rojas").await
    }

    pub async fn superadmin(&self) -> Session {
        self.signed_in_as(Role::Superadmin, "admin@inmo.pe", "Admin").await
    }
}
