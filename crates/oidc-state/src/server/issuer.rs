//! Token issuance seam used by `/callback`.

use async_trait::async_trait;

use crate::session::{Scopes, Tokens};

/// Turns the upstream provider's authorization code into the tokens handed to the client.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Issue tokens for a finished upstream login. `upstream_code` is the code the provider
    /// sent to `/callback`; `nonce` is the client's OIDC nonce from `/authorize`, if any.
    async fn issue(
        &self,
        upstream_code: &str,
        scopes: &Scopes,
        nonce: Option<&str>,
    ) -> anyhow::Result<Tokens>;
}

/// Issues random opaque access and refresh tokens. Never issues an `id_token`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpaqueTokenIssuer;

impl OpaqueTokenIssuer {
    /// Generate a random token using two v4 UUIDs (244 random bits).
    fn generate_token() -> String {
        format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
    }
}

#[async_trait]
impl TokenIssuer for OpaqueTokenIssuer {
    async fn issue(
        &self,
        _upstream_code: &str,
        _scopes: &Scopes,
        _nonce: Option<&str>,
    ) -> anyhow::Result<Tokens> {
        Ok(Tokens {
            access_token: Self::generate_token(),
            refresh_token: Self::generate_token(),
            id_token: None,
        })
    }
}
