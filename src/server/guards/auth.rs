use crate::auth::{AccountId, AuthService};
use crate::error::{AuthorizationFailure, GantryError};
use crate::server::router::GantryState;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

/// Token from `Authorization: Bearer <token>`, if the header is present and well formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// Resolve the request's bearer token to an account. Never mutates session state.
pub async fn authorize(auth: &AuthService, headers: &HeaderMap) -> Result<AccountId, GantryError> {
    let token = bearer_token(headers)
        .ok_or(GantryError::Authorization(AuthorizationFailure::MissingHeader))?;
    auth.authorize(&token).await
}

/// Extractor for routes that need a logged-in caller.
#[derive(Debug, Clone, Copy)]
pub struct RequireSession(pub AccountId);

impl FromRequestParts<GantryState> for RequireSession {
    type Rejection = GantryError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GantryState,
    ) -> Result<Self, Self::Rejection> {
        authorize(&state.auth, &parts.headers)
            .await
            .map(RequireSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::AUTHORIZATION;

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("abc.def"));
        assert_eq!(bearer_token(&headers), None);
    }
}
