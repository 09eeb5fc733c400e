//! Session record types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Scope token for the service-specific permission.
pub const SERVICE_SCOPE: &str = "hoss";

/// `response_type` values accepted by `/authorize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Authorization code flow, tokens fetched from `/token`.
    Code,
    /// Implicit `id_token` delivered in the redirect fragment.
    IdToken,
}

impl ResponseType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::IdToken => "id_token",
        }
    }
}

impl FromStr for ResponseType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            "id_token" => Ok(Self::IdToken),
            _ => Err(()),
        }
    }
}

/// Validated snapshot of an `/authorize` request. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeArgs {
    pub response_type: ResponseType,
    pub client_id: String,
    /// `redirect_uri` exactly as the client sent it.
    pub redirect_uri: String,
    /// Parsed form of `redirect_uri`, checked against the allowed origins.
    pub parsed_redirect: Url,
    pub scope: String,
    /// Opaque caller state, echoed back on the final redirect.
    pub state: Option<String>,
    pub nonce: Option<String>,
}

/// Scope flags derived once from the requested scope string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scopes {
    pub openid: bool,
    pub profile: bool,
    pub email: bool,
    pub service: bool,
}

impl Scopes {
    /// Parse a whitespace-delimited scope string.
    ///
    /// Returns the first unsupported scope token on failure.
    pub fn parse(scope: &str) -> Result<Self, UnknownScope> {
        let mut scopes = Self::default();
        for token in scope.split_whitespace() {
            match token {
                "openid" => scopes.openid = true,
                "profile" => scopes.profile = true,
                "email" => scopes.email = true,
                SERVICE_SCOPE => scopes.service = true,
                other => return Err(UnknownScope(other.to_string())),
            }
        }
        Ok(scopes)
    }
}

/// A scope token that [`Scopes::parse`] does not recognise.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported scope: {0}")]
pub struct UnknownScope(pub String);

/// Tokens handed to the client once the login completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

/// Lifecycle position of a live session. `Consumed` sessions are no longer stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Completed,
}

/// Internal data for one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub auth_args: AuthorizeArgs,
    pub scopes: Scopes,
    /// `None` until the login completes.
    pub tokens: Option<Tokens>,
}

impl Session {
    #[must_use]
    pub const fn new(auth_args: AuthorizeArgs, scopes: Scopes) -> Self {
        Self { auth_args, scopes, tokens: None }
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.tokens.is_some() { SessionState::Completed } else { SessionState::Created }
    }
}
