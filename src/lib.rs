//! Real-estate marketplace core: listings, search, visit booking, accounts.
//!
//! Storage, authentication and geocoding live in an external backend and are
//! reached through the traits in [`store`], [`auth`] and [`geo`]; in-memory
//! implementations of each make the services testable offline.

pub mod auth;
pub mod config;
pub mod error;
pub mod geo;
pub mod messaging;
pub mod models;
pub mod search;
pub mod services;
pub mod store;

pub use auth::{Identity, Session};
pub use config::Config;
pub use error::{AuthError, BookingError, ServiceError, StoreError};
pub use models::{Currency, Listing, Visit};
pub use search::{filter_listings, FilterCriteria};
