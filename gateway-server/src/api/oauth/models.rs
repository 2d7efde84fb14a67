//! OAuth 2.0 data models and request/response structures

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// OAuth 2.0 Authorization Request (Authorization Code Flow with PKCE).
/// Every field is optional at the type level so that missing parameters
/// surface as protocol errors instead of framework rejections.
#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    /// Response type - must be "code"
    pub response_type: Option<String>,
    /// Downstream client identifier
    pub client_id: Option<String>,
    /// Redirect URI where the authorization code will be sent
    pub redirect_uri: Option<String>,
    /// Downstream client's opaque state, echoed back after login
    pub state: Option<String>,
    /// PKCE code challenge (mandatory)
    pub code_challenge: Option<String>,
    /// PKCE code challenge method (S256 or plain, default S256)
    pub code_challenge_method: Option<String>,
}

/// Parameters the upstream provider redirects back with
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// OAuth 2.0 Token Request (authorization_code and refresh_token grants)
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// OAuth 2.0 grant type - "authorization_code" or "refresh_token"
    pub grant_type: Option<String>,
    /// Authorization code (for authorization_code grant)
    pub code: Option<String>,
    /// Redirect URI (must match the authorization request)
    pub redirect_uri: Option<String>,
    /// Downstream client identifier
    pub client_id: Option<String>,
    /// PKCE code verifier (for authorization_code grant)
    pub code_verifier: Option<String>,
    /// Refresh token (for refresh_token grant)
    pub refresh_token: Option<String>,
}

/// OAuth 2.0 Token Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// The access token string
    pub access_token: String,
    /// Token type - always "Bearer"
    pub token_type: String,
    /// Access token expiration in seconds
    pub expires_in: u64,
    /// Rotated refresh token
    pub refresh_token: String,
}

/// OAuth 2.0 Error Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OAuthError {
    /// Error code
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl OAuthError {
    /// Create an invalid_request error
    pub fn invalid_request(description: &str) -> Self {
        Self {
            error: "invalid_request".to_string(),
            error_description: Some(description.to_string()),
        }
    }

    /// Create an invalid_grant error
    pub fn invalid_grant(description: &str) -> Self {
        Self {
            error: "invalid_grant".to_string(),
            error_description: Some(description.to_string()),
        }
    }

    /// Create an unsupported_grant_type error
    pub fn unsupported_grant_type() -> Self {
        Self {
            error: "unsupported_grant_type".to_string(),
            error_description: Some(
                "Supported grant types: authorization_code, refresh_token".to_string(),
            ),
        }
    }

    /// Create an unsupported_response_type error
    pub fn unsupported_response_type() -> Self {
        Self {
            error: "unsupported_response_type".to_string(),
            error_description: Some("Only 'code' response type is supported".to_string()),
        }
    }

    /// Create an access_denied error
    pub fn access_denied(description: &str) -> Self {
        Self {
            error: "access_denied".to_string(),
            error_description: Some(description.to_string()),
        }
    }

    /// Create a server_error
    pub fn server_error(description: &str) -> Self {
        Self {
            error: "server_error".to_string(),
            error_description: Some(description.to_string()),
        }
    }

    /// Pass an upstream-reported error through without translation
    pub fn passthrough(error: String, error_description: Option<String>) -> Self {
        Self {
            error,
            error_description,
        }
    }
}

/// Dynamic client registration request (RFC 7591). Unknown metadata
/// fields are accepted and ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub redirect_uris: Option<Vec<String>>,
}

/// Dynamic client registration response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationResponse {
    /// Freshly generated client identifier
    pub client_id: String,
    pub client_name: String,
    pub redirect_uris: Vec<String>,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub token_endpoint_auth_method: String,
}
