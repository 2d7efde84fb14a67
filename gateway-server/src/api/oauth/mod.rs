//! OAuth 2.0 Authorization Server surface of the gateway
//!
//! The gateway speaks the Authorization Code grant with PKCE to downstream
//! clients and delegates the actual login to the upstream identity
//! provider, gated by the member allow-list.
//!
//! ## Endpoints
//! - `GET /authorize` - start the flow, redirects to the upstream login
//! - `GET /callback` - upstream return leg, issues the downstream code
//! - `POST /token` - authorization_code and refresh_token grants
//! - `POST /register` - dynamic client registration stub (RFC 7591)
//! - `GET /.well-known/oauth-authorization-server` - metadata (RFC 8414)

pub mod handlers;
pub mod models;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

/// Creates the OAuth 2.0 routes
pub fn router() -> Router<AppState> {
    // Discovery and registration are called cross-origin by browser-based
    // clients before any auth exists
    let open_routes = Router::new()
        .route(
            "/.well-known/oauth-authorization-server",
            get(handlers::metadata),
        )
        .route("/register", post(handlers::register))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/authorize", get(handlers::authorize))
        .route("/callback", get(handlers::callback))
        .route("/token", post(handlers::token))
        .merge(open_routes)
}
