//! In-memory login session store.
//!
//! Every record lives under a CSPRNG identifier until it is consumed or its deadline passes.
//! All mutations happen under one write lock, so a consume is a single check-and-remove step.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use super::id::SessionId;
use super::types::{AuthorizeArgs, Scopes, Session, SessionState, Tokens};
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};

struct StoredSession {
    session: Session,
    created_at: Instant,
}

impl StoredSession {
    fn is_expired(&self, config: &SessionConfig) -> bool {
        self.created_at.elapsed() > config.ttl
    }
}

/// In-memory session store shared by the HTTP handlers.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, StoredSession>>>,
    config: SessionConfig,
}

impl SessionStore {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())), config }
    }

    /// Generate an identifier of the configured length.
    #[must_use]
    pub fn generate_session_id(&self) -> SessionId {
        SessionId::generate(self.config.id_length)
    }

    /// Store a new session and return the identifier it can be retrieved with.
    ///
    /// Identifiers still held by any record, expired or not, are never reused.
    pub async fn create_session(
        &self,
        auth_args: AuthorizeArgs,
        scopes: Scopes,
    ) -> SessionResult<SessionId> {
        let mut sessions = self.sessions.write().await;

        for _ in 0..self.config.max_id_attempts {
            let id = self.generate_session_id();
            if sessions.contains_key(&id) {
                continue;
            }
            sessions.insert(
                id.clone(),
                StoredSession {
                    session: Session::new(auth_args, scopes),
                    created_at: Instant::now(),
                },
            );
            return Ok(id);
        }

        Err(SessionError::Conflict { attempts: self.config.max_id_attempts })
    }

    /// Look up a live session without removing it.
    pub async fn get_session(&self, id: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        let stored = sessions.get(id)?;
        if stored.is_expired(&self.config) {
            return None;
        }
        Some(stored.session.clone())
    }

    /// Attach the issued tokens, moving the session from `Created` to `Completed`.
    pub async fn complete_session(&self, id: &str, tokens: Tokens) -> SessionResult<()> {
        let mut sessions = self.sessions.write().await;

        let stored = sessions.get_mut(id).ok_or(SessionError::NotFound)?;
        if stored.is_expired(&self.config) {
            sessions.remove(id);
            return Err(SessionError::NotFound);
        }
        if stored.session.state() == SessionState::Completed {
            return Err(SessionError::invalid_input("tokens", "session already completed"));
        }

        stored.session.tokens = Some(tokens);
        Ok(())
    }

    /// Remove and return a live session. At most one caller gets `Some` per identifier.
    pub async fn consume_session(&self, id: &str) -> Option<Session> {
        let stored = self.sessions.write().await.remove(id)?;
        if stored.is_expired(&self.config) {
            return None;
        }
        Some(stored.session)
    }

    /// Remove and return a session only if its tokens have been issued.
    ///
    /// A session still in `Created` is left in place.
    pub async fn consume_completed(&self, id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;

        let stored = sessions.get(id)?;
        if stored.is_expired(&self.config) {
            sessions.remove(id);
            return None;
        }
        if stored.session.state() != SessionState::Completed {
            return None;
        }

        sessions.remove(id).map(|stored| stored.session)
    }

    /// Number of stored sessions, including expired ones not yet swept.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| !stored.is_expired(&self.config));
        before - sessions.len()
    }

    /// Start background cleanup task for expired sessions.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.cleanup_interval);
            loop {
                interval.tick().await;
                let removed = self.cleanup_expired().await;
                if removed > 0 {
                    tracing::debug!(count = removed, "Cleaned up expired sessions");
                }
            }
        });
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("config", &self.config).finish()
    }
}
