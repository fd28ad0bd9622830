pub mod memory;
pub mod rest;
pub mod traits;

pub use memory::{MemoryObjects, MemoryStore};
pub use rest::{RestObjects, RestStore};
pub use traits::{DocumentStore, ObjectStore, StoreResult};
