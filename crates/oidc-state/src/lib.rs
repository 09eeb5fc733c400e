//! OIDC Login State
//!
//! Server-side session tracking for the OAuth 2.0 / OpenID Connect authorization code flow.
//! Each login attempt gets an unguessable identifier that correlates the `/authorize`
//! redirect with the provider callback and the final `/token` exchange.
//!
//! # Features
//!
//! - **Exactly-once consume**: check-and-remove happens under a single write lock
//! - **Bounded lifetime**: sessions expire after a TTL and are swept in the background
//! - **CSPRNG identifiers**: drawn from the OS random source
//!
//! # Example
//!
//! ```no_run
//! use oidc_state::{config::SessionConfig, session::SessionStore};
//!
//! # async fn run(args: oidc_state::session::AuthorizeArgs) -> anyhow::Result<()> {
//! let store = SessionStore::new(SessionConfig::default());
//! let id = store.create_session(args, Default::default()).await?;
//! let session = store.consume_session(id.as_str()).await;
//! assert!(session.is_some());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod session;

pub use config::Config;
pub use error::{SessionError, SessionResult};
pub use session::SessionStore;
