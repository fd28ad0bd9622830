pub mod lenient;
pub mod listing;

pub use listing::{
    Antiquity, Availability, Currency, Listing, ListingPatch, Operation, VisitSlot,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role, stored on the user profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[default]
    #[serde(rename = "cliente", alias = "client")]
    Client,
    #[serde(rename = "agente", alias = "agent")]
    Agent,
    #[serde(rename = "superadmin", alias = "admin")]
    Superadmin,
}

impl Role {
    /// Agents and superadmins may publish listings and tips
    pub fn can_publish(&self) -> bool {
        matches!(self, Role::Agent | Role::Superadmin)
    }
}

/// Profile document in the `users` collection, keyed by auth uid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(deserialize_with = "lenient::text")]
    pub uid: String,
    #[serde(deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(deserialize_with = "lenient::text")]
    pub display_name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub phone: String,
    pub role: Role,
    #[serde(deserialize_with = "lenient::opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitStatus {
    #[default]
    #[serde(rename = "pendiente", alias = "pending")]
    Pending,
    #[serde(rename = "confirmada", alias = "confirmed")]
    Confirmed,
    #[serde(rename = "cancelada", alias = "cancelled")]
    Cancelled,
}

/// A booked viewing, stored in the `visits` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    #[serde(default)]
    pub id: String,
    pub property_id: String,
    #[serde(default)]
    pub property_title: String,
    pub agent_id: String,
    pub client_id: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_phone: String,
    #[serde(default)]
    pub client_email: String,
    pub visit_date: String,
    pub visit_time: String,
    #[serde(default)]
    pub status: VisitStatus,
    pub timestamp: DateTime<Utc>,
}

/// Contact request from a prospective client to the listing's agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    #[serde(default)]
    pub id: String,
    pub property_id: String,
    #[serde(default)]
    pub property_title: String,
    pub agent_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// Blog post in the `tips` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tip {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default = "published_by_default")]
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

fn published_by_default() -> bool {
    true
}

/// One-time code that upgrades a client account to agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationCode {
    pub code: String,
    #[serde(default)]
    pub used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
}

impl ActivationCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            used: false,
            used_by: None,
            used_at: None,
        }
    }
}
