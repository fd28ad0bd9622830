pub mod memory;
pub mod rest;
pub mod session;
pub mod traits;
pub mod types;

pub use memory::MemoryAuth;
pub use rest::RestAuth;
pub use session::Session;
pub use traits::{AuthProvider, AuthResult};
pub use types::{AuthUser, Identity, SignUp};
