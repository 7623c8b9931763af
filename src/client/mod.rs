//! Client-side session core: the auth state machine a front end drives,
//! the credential it attaches to outgoing calls, and the category filter
//! it applies to listed expenses. No HTTP here; callers feed in the
//! outcomes of their own requests.

pub mod credentials;
pub mod filter;
pub mod session;

pub use credentials::{Credential, CredentialStore, MemoryCredentialStore};
pub use filter::CategoryFilter;
pub use session::{AuthEvent, AuthState, SessionUser};
