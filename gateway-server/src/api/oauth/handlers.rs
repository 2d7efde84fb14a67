//! OAuth 2.0 endpoint handlers
//!
//! The gateway presents itself to downstream clients as an authorization
//! server (authorization code grant with PKCE) while delegating the actual
//! login to the upstream identity provider: `/authorize` parks the
//! downstream request and redirects upstream, `/callback` turns a verified
//! upstream login into a single-use authorization code, `/token` exchanges
//! that code (or a refresh token) for tokens signed by the gateway itself.
//! Upstream tokens never reach the downstream client.

use crate::api::oauth::models::{
    AuthorizeRequest, CallbackParams, OAuthError, RegistrationRequest, RegistrationResponse,
    TokenRequest, TokenResponse,
};
use crate::auth::pkce::verify_code_challenge;
use crate::auth::tokens::{random_token, TokenKind};
use crate::openapi::OAUTH_TAG;
use crate::state::AppState;
use crate::store::{AuthStore, AuthorizationCode, PendingAuthorization};
use crate::upstream::{decode_id_token, UpstreamError};
use axum::{
    extract::{
        rejection::JsonRejection, FromRequest, Query, Request, State,
    },
    http::{header, header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use log::{debug, error, info, warn};
use serde_json::json;
use std::time::{Duration, Instant};
use url::Url;
use uuid::Uuid;

/// OAuth 2.0 Authorization endpoint (RFC 6749 Section 4.1.1).
/// Parks the downstream request and redirects the user agent to the
/// upstream provider's login.
#[utoipa::path(
    get,
    path = "/authorize",
    params(
        ("response_type" = String, Query, description = "Must be 'code'"),
        ("client_id" = String, Query, description = "Downstream client identifier"),
        ("redirect_uri" = String, Query, description = "Downstream redirect URI"),
        ("state" = String, Query, description = "Downstream client's opaque state"),
        ("code_challenge" = String, Query, description = "PKCE code challenge"),
        ("code_challenge_method" = Option<String>, Query, description = "PKCE method, S256 (default) or plain")
    ),
    responses(
        (status = 302, description = "Redirect to the upstream provider's login"),
        (status = 400, description = "Invalid request", body = OAuthError)
    ),
    tag = OAUTH_TAG
)]
pub(crate) async fn authorize(
    State(state): State<AppState>,
    Query(request): Query<AuthorizeRequest>,
) -> Response {
    let (client_id, redirect_uri, response_type, original_state) = match (
        request.client_id,
        request.redirect_uri,
        request.response_type,
        request.state,
    ) {
        (Some(client_id), Some(redirect_uri), Some(response_type), Some(state)) => {
            (client_id, redirect_uri, response_type, state)
        }
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_request("Missing required parameters"),
            );
        }
    };

    if response_type != "code" {
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::unsupported_response_type(),
        );
    }

    // PKCE is mandatory; there is no public-client-without-PKCE fallback
    let code_challenge = match request.code_challenge {
        Some(challenge) => challenge,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_request("code_challenge is required"),
            );
        }
    };
    let code_challenge_method = request
        .code_challenge_method
        .unwrap_or_else(|| "S256".to_string());

    info!(
        "Authorization request from client '{}', delegating login upstream",
        client_id
    );

    // The internal state both keys the pending entry and correlates the
    // upstream round trip
    let internal_state = random_token(16);
    state
        .store
        .put_pending(
            &internal_state,
            PendingAuthorization {
                code_challenge,
                code_challenge_method,
                redirect_uri,
                client_id,
                created_at: Instant::now(),
            },
        )
        .await;

    // Combined state carries our correlation key and the client's own state
    // through the upstream provider in one field
    let combined_state = format!("{internal_state}:{original_state}");
    let upstream_url = state
        .upstream
        .authorize_url(&state.config.callback_url(), &combined_state);

    found(upstream_url.as_str())
}

/// Callback endpoint the upstream provider redirects back to after login.
/// Exchanges the upstream code, gates the verified identity on the member
/// allow-list, and completes the downstream flow with a fresh code.
#[utoipa::path(
    get,
    path = "/callback",
    params(
        ("code" = Option<String>, Query, description = "Upstream authorization code"),
        ("state" = Option<String>, Query, description = "Combined state from the authorize redirect"),
        ("error" = Option<String>, Query, description = "Upstream error code"),
        ("error_description" = Option<String>, Query, description = "Upstream error description")
    ),
    responses(
        (status = 302, description = "Redirect to the downstream client with an authorization code"),
        (status = 400, description = "Invalid request or state", body = OAuthError),
        (status = 403, description = "Authenticated user is not a member", body = OAuthError),
        (status = 500, description = "Upstream exchange failed", body = OAuthError)
    ),
    tag = OAUTH_TAG
)]
pub(crate) async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    // Upstream failures pass through untranslated
    if let Some(error) = params.error {
        warn!("Upstream login failed: {}", error);
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::passthrough(error, params.error_description),
        );
    }

    let (upstream_code, combined_state) = match (params.code, params.state) {
        (Some(code), Some(state)) => (code, state),
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_request("Missing code or state"),
            );
        }
    };

    let (internal_state, original_state) = match combined_state.split_once(':') {
        Some(parts) => parts,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_request("Invalid state format"),
            );
        }
    };

    // Atomic consume: replayed, forged, or already-used states all miss here
    let pending = match state.store.consume_pending(internal_state).await {
        Some(pending) => pending,
        None => {
            warn!("Callback with unknown or already consumed state");
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_grant("Invalid or expired state"),
            );
        }
    };

    // The exchange is a network round trip; it runs only after the pending
    // entry is gone, never under a store lock. The callback URL must match
    // the one advertised to the upstream authorize endpoint byte-for-byte.
    let callback_url = state.config.callback_url();
    let upstream_tokens = match state
        .upstream
        .exchange_code(&upstream_code, &callback_url)
        .await
    {
        Ok(tokens) => tokens,
        Err(e) => {
            error!("Upstream token exchange failed: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Token exchange with the upstream provider failed"),
            );
        }
    };

    let claims = match upstream_tokens
        .id_token
        .as_deref()
        .ok_or(UpstreamError::MissingIdToken)
        .and_then(decode_id_token)
    {
        Ok(claims) => claims,
        Err(e) => {
            error!("Failed to read upstream ID token: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Could not read identity from the upstream response"),
            );
        }
    };

    debug!("Upstream identity verified, sub={:?}", claims.sub);
    let email = match claims.email_claim() {
        Some(email) => email.to_string(),
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_request("Could not determine user email"),
            );
        }
    };

    // The authorization boundary of the whole system
    if !state.members.is_member(&email) {
        info!("Access denied for '{}'", email);
        return error_response(
            StatusCode::FORBIDDEN,
            OAuthError::access_denied("You are not a member of this deployment"),
        );
    }
    info!("User authenticated: {}", email);

    let mut redirect_url = match Url::parse(&pending.redirect_uri) {
        Ok(url) => url,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_request("Invalid redirect_uri"),
            );
        }
    };

    // Mint the downstream code, carrying the PKCE commitment forward
    // unchanged for verification at exchange time
    let code = random_token(32);
    state
        .store
        .put_code(
            &code,
            AuthorizationCode {
                email,
                code_challenge: pending.code_challenge,
                code_challenge_method: pending.code_challenge_method,
                redirect_uri: pending.redirect_uri.clone(),
                client_id: pending.client_id,
                expires_at: Instant::now()
                    + Duration::from_secs(state.config.store.code_ttl_secs),
            },
        )
        .await;

    redirect_url
        .query_pairs_mut()
        .append_pair("code", &code)
        .append_pair("state", original_state);

    found(redirect_url.as_str())
}

/// OAuth 2.0 Token endpoint (RFC 6749 Section 3.2).
/// Supports the authorization_code and refresh_token grants; accepts
/// form-encoded or JSON bodies.
#[utoipa::path(
    post,
    path = "/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Tokens issued", body = TokenResponse),
        (status = 400, description = "Invalid request or grant", body = OAuthError)
    ),
    tag = OAUTH_TAG
)]
pub(crate) async fn token(
    State(state): State<AppState>,
    TokenRequestExtractor(request): TokenRequestExtractor,
) -> Response {
    match request.grant_type.as_deref() {
        Some("authorization_code") => handle_authorization_code_grant(state, request).await,
        Some("refresh_token") => handle_refresh_token_grant(state, request).await,
        other => {
            warn!(
                "Unsupported grant type '{}' in token request",
                other.unwrap_or("<missing>")
            );
            error_response(StatusCode::BAD_REQUEST, OAuthError::unsupported_grant_type())
        }
    }
}

/// Handle the authorization_code grant: consume the code, re-verify the
/// client binding and the PKCE commitment, then mint a token pair
async fn handle_authorization_code_grant(state: AppState, request: TokenRequest) -> Response {
    let (code, redirect_uri, client_id, code_verifier) = match (
        request.code,
        request.redirect_uri,
        request.client_id,
        request.code_verifier,
    ) {
        (Some(code), Some(redirect_uri), Some(client_id), Some(code_verifier)) => {
            (code, redirect_uri, client_id, code_verifier)
        }
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_request("Missing required parameters"),
            );
        }
    };

    // Single use: the entry is removed up front, so every failure branch
    // below also burns the code
    let grant = match state.store.consume_code(&code).await {
        Some(grant) => grant,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_grant("Invalid or expired authorization code"),
            );
        }
    };

    if grant.is_expired() {
        warn!("Expired authorization code presented by client '{}'", client_id);
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_grant("Authorization code expired"),
        );
    }

    if grant.redirect_uri != redirect_uri {
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_grant("redirect_uri mismatch"),
        );
    }

    if grant.client_id != client_id {
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_grant("client_id mismatch"),
        );
    }

    if !verify_code_challenge(&code_verifier, &grant.code_challenge, &grant.code_challenge_method)
    {
        warn!("PKCE verification failed for client '{}'", client_id);
        return error_response(
            StatusCode::BAD_REQUEST,
            OAuthError::invalid_grant("PKCE verification failed"),
        );
    }

    info!(
        "Issuing tokens for '{}' via client '{}'",
        grant.email, client_id
    );
    issue_token_pair(&state, &grant.email)
}

/// Handle the refresh_token grant: verify the presented token and rotate
/// in a fresh access/refresh pair. The old refresh token carries no
/// server-side state and stays valid until its own expiry.
async fn handle_refresh_token_grant(state: AppState, request: TokenRequest) -> Response {
    let refresh_token = match request.refresh_token {
        Some(token) => token,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_request("Missing refresh_token"),
            );
        }
    };

    // Bad signature, expiry, and kind mismatch all read the same to the
    // caller
    let claims = match state.tokens.verify(&refresh_token, TokenKind::Refresh) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Refresh token rejected: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::invalid_grant("Invalid refresh token"),
            );
        }
    };

    debug!("Rotating token pair for '{}'", claims.email);
    issue_token_pair(&state, &claims.email)
}

/// Dynamic client registration stub (RFC 7591): every caller gets a fresh
/// client id, no persistence
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Client registered", body = RegistrationResponse),
        (status = 400, description = "Invalid client metadata", body = OAuthError)
    ),
    tag = OAUTH_TAG
)]
pub(crate) async fn register(
    request: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                OAuthError::passthrough("invalid_client_metadata".to_string(), None),
            );
        }
    };

    let response = RegistrationResponse {
        client_id: Uuid::new_v4().to_string(),
        client_name: request
            .client_name
            .unwrap_or_else(|| "MCP Client".to_string()),
        redirect_uris: request.redirect_uris.unwrap_or_default(),
        grant_types: vec![
            "authorization_code".to_string(),
            "refresh_token".to_string(),
        ],
        response_types: vec!["code".to_string()],
        token_endpoint_auth_method: "none".to_string(),
    };

    debug!("Registered client '{}'", response.client_id);
    (StatusCode::CREATED, Json(response)).into_response()
}

/// RFC 8414 authorization server metadata document
#[utoipa::path(
    get,
    path = "/.well-known/oauth-authorization-server",
    responses(
        (status = 200, description = "Authorization server metadata")
    ),
    tag = OAUTH_TAG
)]
pub(crate) async fn metadata(State(state): State<AppState>) -> Response {
    let issuer = state.config.public_url.trim_end_matches('/').to_string();

    Json(json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/authorize"),
        "token_endpoint": format!("{issuer}/token"),
        "registration_endpoint": format!("{issuer}/register"),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code", "refresh_token"],
        "code_challenge_methods_supported": ["S256"],
        "token_endpoint_auth_methods_supported": ["none"],
    }))
    .into_response()
}

/// Mint a fresh access/refresh pair for a verified identity
fn issue_token_pair(state: &AppState, email: &str) -> Response {
    let access_token = match state.tokens.mint(email, TokenKind::Access) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to mint access token: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Failed to issue tokens"),
            );
        }
    };
    let refresh_token = match state.tokens.mint(email, TokenKind::Refresh) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to mint refresh token: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                OAuthError::server_error("Failed to issue tokens"),
            );
        }
    };

    Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.tokens.access_ttl_secs,
        refresh_token,
    })
    .into_response()
}

/// Custom extractor that handles both form-encoded and JSON token requests
pub(crate) struct TokenRequestExtractor(pub TokenRequest);

impl<S> FromRequest<S> for TokenRequestExtractor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("");

        if content_type.starts_with("application/json") {
            match Json::<TokenRequest>::from_request(req, state).await {
                Ok(Json(request)) => Ok(Self(request)),
                Err(_) => Err(error_response(
                    StatusCode::BAD_REQUEST,
                    OAuthError::invalid_request("Invalid JSON in request body"),
                )),
            }
        } else {
            // Form-encoded is the default
            match Form::<TokenRequest>::from_request(req, state).await {
                Ok(Form(request)) => Ok(Self(request)),
                Err(_) => Err(error_response(
                    StatusCode::BAD_REQUEST,
                    OAuthError::invalid_request("Invalid form data in request body"),
                )),
            }
        }
    }
}

/// Helper function to create error responses
fn error_response(status: StatusCode, error: OAuthError) -> Response {
    (status, Json(error)).into_response()
}

/// Plain 302 redirect; the protocol's redirects are all Found
fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}
