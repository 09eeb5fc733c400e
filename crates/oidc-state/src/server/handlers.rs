//! OIDC endpoint handlers.
//!
//! Implements:
//! - `/authorize`: start a login and hand off to the upstream identity provider
//! - `/callback`: finish the upstream login and issue tokens into the session
//! - `/token`: RFC 6749 §4.1.3 authorization code exchange

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{
        Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use url::Url;

use super::authorize::{AuthorizeQuery, AuthorizeRejection, validate_authorize};
use super::routes::AppState;
use crate::config::{Config, defaults};
use crate::error::SessionError;
use crate::session::{ResponseType, SessionId, Tokens};

// ─── Authorization Endpoint ──────────────────────────────────────────────────

/// `GET /authorize`
///
/// Validate the request, open a session and redirect to the upstream provider with the
/// session identifier as `state`.
pub async fn handle_authorize(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AuthorizeQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return oidc_error("invalid_request", "Couldn't bind parameters");
    };
    let (args, scopes) = match validate_authorize(query, &state.config) {
        Ok(validated) => validated,
        Err(AuthorizeRejection::Direct { error, description }) => {
            return oidc_error(error, &description);
        }
        Err(AuthorizeRejection::Redirect { redirect, error, description }) => {
            return oidc_error_redirect(&redirect, error, &description);
        }
    };

    let client_id = args.client_id.clone();
    let response_type = args.response_type;

    let sv = match state.store.create_session(args, scopes).await {
        Ok(sv) => sv,
        Err(err) => return session_error(&err),
    };

    tracing::info!(
        client_id = %client_id,
        response_type = response_type.as_str(),
        "Started login"
    );

    redirect(provider_authorize_url(&state.config, &sv).as_str())
}

/// Build the upstream authorization URL carrying our session identifier.
fn provider_authorize_url(config: &Config, sv: &SessionId) -> Url {
    let mut url = config.provider.authorize_url.clone();
    url.query_pairs_mut()
        .append_pair("client_id", &config.provider.client_id)
        .append_pair("redirect_uri", &config.callback_url())
        .append_pair("response_type", "code")
        .append_pair("scope", defaults::PROVIDER_SCOPES)
        .append_pair("state", sv.as_str());
    url
}

// ─── Callback Endpoint ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

/// `GET /callback`
///
/// The upstream provider returns here with our session identifier and its own code.
pub async fn handle_callback(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return oidc_error("invalid_request", "Couldn't bind parameters");
    };
    let Some(sv) = query.state.filter(|s| !s.is_empty()) else {
        return oidc_error("invalid_request", "No 'state' value provided");
    };

    let Some(session) = state.store.get_session(&sv).await else {
        return oidc_error("invalid_request", "Invalid 'state' value provided");
    };
    let mut redirect_url = session.auth_args.parsed_redirect.clone();

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return oidc_error_redirect(&redirect_url, "invalid_request", "No 'code' value provided");
    };

    let tokens = match state
        .issuer
        .issue(&code, &session.scopes, session.auth_args.nonce.as_deref())
        .await
    {
        Ok(tokens) => tokens,
        Err(err) => {
            tracing::warn!(client_id = %session.auth_args.client_id, error = %err, "Token issuance failed");
            state.store.consume_session(&sv).await;
            return oidc_error_redirect(&redirect_url, "server_error", &err.to_string());
        }
    };

    match session.auth_args.response_type {
        ResponseType::Code => {
            if let Err(err) = state.store.complete_session(&sv, tokens).await {
                return match err {
                    SessionError::NotFound => {
                        oidc_error("invalid_request", "Invalid 'state' value provided")
                    }
                    other => session_error(&other),
                };
            }

            // The session identifier doubles as the authorization code for `/token`.
            let mut pairs = redirect_url.query_pairs_mut();
            pairs.append_pair("code", &sv);
            if let Some(ref client_state) = session.auth_args.state {
                pairs.append_pair("state", client_state);
            }
            drop(pairs);

            tracing::info!(client_id = %session.auth_args.client_id, "Login completed");
            redirect(redirect_url.as_str())
        }
        ResponseType::IdToken => {
            if state.store.consume_session(&sv).await.is_none() {
                return oidc_error("invalid_request", "Invalid 'state' value provided");
            }
            let Some(id_token) = tokens.id_token else {
                return oidc_error_redirect(
                    &redirect_url,
                    "server_error",
                    "No id_token was issued for this login",
                );
            };

            let mut fragment = url::form_urlencoded::Serializer::new(String::new());
            fragment.append_pair("id_token", &id_token);
            if let Some(ref client_state) = session.auth_args.state {
                fragment.append_pair("state", client_state);
            }
            redirect_url.set_fragment(Some(&fragment.finish()));

            tracing::info!(client_id = %session.auth_args.client_id, "Login completed with id_token");
            redirect(redirect_url.as_str())
        }
    }
}

// ─── Token Endpoint ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub nonce: Option<String>,
}

/// `POST /token`
///
/// Exchange the authorization code for the tokens stored in its session.
pub async fn handle_token(
    State(state): State<Arc<AppState>>,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = form else {
        return oidc_error("invalid_request", "Couldn't bind parameters");
    };
    match form.grant_type.as_deref() {
        Some("authorization_code") => handle_authorization_code_grant(&state, &form).await,
        Some("refresh_token") => oidc_error(
            "unsupported_grant_type",
            "refresh_token grants are not supported by this server",
        ),
        Some(_) => {
            oidc_error("unsupported_grant_type", "grant_type must be `authorization_code`")
        }
        None => oidc_error("invalid_request", "Missing grant_type"),
    }
}

async fn handle_authorization_code_grant(state: &AppState, form: &TokenRequest) -> Response {
    if form.client_id.as_deref() != Some(state.config.client_id.as_str()) {
        return oidc_error("invalid_request", "Unknown client_id");
    }
    let Some(ref code) = form.code else {
        return oidc_error("invalid_request", "Missing code");
    };

    let Some(session) = state.store.consume_completed(code).await else {
        return session_error(&SessionError::NotFound);
    };

    if let Some(ref redirect_uri) = form.redirect_uri {
        if !redirect_uri.is_empty() && *redirect_uri != session.auth_args.redirect_uri {
            return oidc_error("invalid_request", "invalid redirect_uri");
        }
    }

    let Some(tokens) = session.tokens else {
        return session_error(&SessionError::NotFound);
    };

    tracing::info!(client_id = %session.auth_args.client_id, "Exchanged authorization code");

    token_success(&tokens)
}

// ─── Responses ───────────────────────────────────────────────────────────────

/// Build a token response with required OAuth 2.0 cache headers (RFC 6749 §5.1).
fn token_success(tokens: &Tokens) -> Response {
    let mut response = Json(tokens).into_response();

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

/// 400 with an OAuth error body.
fn oidc_error(error: &str, description: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "error": error,
            "error_description": description
        })),
    )
        .into_response()
}

/// Report an error to the client by redirecting with `error` and `error_description`.
fn oidc_error_redirect(redirect_uri: &Url, error: &str, description: &str) -> Response {
    let mut url = redirect_uri.clone();
    url.query_pairs_mut().append_pair("error", error).append_pair("error_description", description);
    redirect(url.as_str())
}

fn session_error(err: &SessionError) -> Response {
    if err.is_client_error() {
        return oidc_error(err.oauth_error_code(), &err.to_string());
    }

    tracing::error!(error = %err, "Session store failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": err.oauth_error_code(),
            "error_description": "Internal error"
        })),
    )
        .into_response()
}
