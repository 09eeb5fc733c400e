//! Login session state for the OAuth 2.0 / OIDC authorization code flow.
//!
//! A session is created when `/authorize` is processed, completed when the upstream
//! provider calls back and tokens are issued, and consumed exactly once by `/token`.
//!
//! ```text
//! Created --complete--> Completed --consume--> (removed)
//!    \______________________consume___________/
//! ```
//!
//! Sessions that outlive the configured TTL are unreachable and swept in the background.

pub mod id;
pub mod store;
pub mod types;

pub use id::SessionId;
pub use store::SessionStore;
pub use types::{AuthorizeArgs, ResponseType, Scopes, Session, SessionState, Tokens};
