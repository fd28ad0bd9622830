pub mod currency;
pub mod pipeline;
pub mod types;

pub use currency::{convert, EXCHANGE_RATE};
pub use pipeline::{filter_listings, matches, promoted_first, sort_listings};
pub use types::{FilterCriteria, PropertyType, SortKey};
