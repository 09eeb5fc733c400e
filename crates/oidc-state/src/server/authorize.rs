//! `/authorize` argument validation.
//!
//! Until `redirect_uri` is known to point at an allowed origin, failures are answered
//! directly with a 400. After that they are reported by redirecting back to the client.

use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::session::{AuthorizeArgs, ResponseType, Scopes};

/// Raw `/authorize` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeQuery {
    pub response_type: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub nonce: Option<String>,
}

/// Why an `/authorize` request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizeRejection {
    /// The redirect target is not trusted; answer with a 400 body.
    Direct { error: &'static str, description: String },
    /// Report the error to the client through its redirect URI.
    Redirect { redirect: Url, error: &'static str, description: String },
}

impl AuthorizeRejection {
    fn direct(error: &'static str, description: impl Into<String>) -> Self {
        Self::Direct { error, description: description.into() }
    }

    fn redirect(redirect: &Url, error: &'static str, description: impl Into<String>) -> Self {
        Self::Redirect { redirect: redirect.clone(), error, description: description.into() }
    }
}

/// Validate an `/authorize` request and derive its scopes.
pub fn validate_authorize(
    query: AuthorizeQuery,
    config: &Config,
) -> Result<(AuthorizeArgs, Scopes), AuthorizeRejection> {
    let Some(redirect_uri) = query.redirect_uri.filter(|u| !u.is_empty()) else {
        return Err(AuthorizeRejection::direct("invalid_request", "Missing redirect_uri"));
    };
    let Ok(parsed_redirect) = Url::parse(&redirect_uri) else {
        return Err(AuthorizeRejection::direct("invalid_request", "Could not parse redirect_uri"));
    };

    // No client callback registration exists, so only known origins may be redirected to.
    if !is_redirect_allowed(&parsed_redirect, config) {
        tracing::info!(redirect_uri = %redirect_uri, "Redirect URI not allowed");
        return Err(AuthorizeRejection::direct("invalid_request", "redirect_uri host is invalid"));
    }

    let Some(response_type) =
        query.response_type.as_deref().and_then(|r| r.parse::<ResponseType>().ok())
    else {
        return Err(AuthorizeRejection::redirect(
            &parsed_redirect,
            "unsupported_response_type",
            "Only 'code' or 'id_token' response_type supported",
        ));
    };

    let client_id = query.client_id.unwrap_or_default();
    if client_id != config.client_id {
        return Err(AuthorizeRejection::redirect(
            &parsed_redirect,
            "invalid_request",
            "Unknown client_id",
        ));
    }

    let scope = query.scope.unwrap_or_default();
    let scopes = Scopes::parse(&scope).map_err(|unknown| {
        AuthorizeRejection::redirect(&parsed_redirect, "invalid_scope", unknown.to_string())
    })?;

    if response_type == ResponseType::IdToken && !scopes.openid {
        return Err(AuthorizeRejection::redirect(
            &parsed_redirect,
            "invalid_request",
            "Require openid scope for id_token",
        ));
    }

    let args = AuthorizeArgs {
        response_type,
        client_id,
        redirect_uri,
        parsed_redirect,
        scope,
        state: query.state.filter(|s| !s.is_empty()),
        nonce: query.nonce.filter(|n| !n.is_empty()),
    };
    Ok((args, scopes))
}

/// Check the redirect origin against this service and the additional allowed servers.
///
/// In dev mode any origin passes, with a warning.
pub fn is_redirect_allowed(redirect: &Url, config: &Config) -> bool {
    let origin = redirect.origin().ascii_serialization();

    let allowed = std::iter::once(&config.external_hostname)
        .chain(&config.additional_allowed_servers)
        .any(|server| server.trim_end_matches('/') == origin);
    if allowed {
        return true;
    }

    if config.dev_mode {
        tracing::warn!(origin = %origin, "Redirect not in allowed server list, allowed due to dev mode");
        return true;
    }

    false
}
