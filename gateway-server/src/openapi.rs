use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const OAUTH_TAG: &str = "OAuth 2.0";

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = OAUTH_TAG, description = "Delegated authorization endpoints"),
    ),
    paths(
        crate::api::health::health_check,
        crate::api::oauth::handlers::authorize,
        crate::api::oauth::handlers::callback,
        crate::api::oauth::handlers::token,
        crate::api::oauth::handlers::register,
        crate::api::oauth::handlers::metadata,
    ),
    info(
        title = "OAuth Delegation Gateway API",
        description = "Authorization-code-with-PKCE gateway delegating login to an upstream identity provider",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
