use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::auth::jwt::JwtKeys;
use crate::error::{AppError, AuthFailure};

/// The authenticated caller. Extracting it verifies the bearer token; the
/// user record itself is not loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i64);

/// Pulls the token out of `Authorization: Bearer <token>`. Other schemes
/// count as no token at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let token = bearer_token(&parts.headers).ok_or(AuthFailure::MissingToken)?;
        let user_id = JwtKeys::from_ref(state)
            .verify(token)
            .map_err(AuthFailure::InvalidToken)?;

        tracing::Span::current().record("user_id", user_id);
        debug!(user_id, "request authenticated");

        parts.extensions.insert(AuthUser(user_id));
        Ok(AuthUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenError;
    use crate::config::AppConfig;
    use axum::http::Request;
    use time::{Duration, OffsetDateTime};

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&AppConfig::for_tests("gate-test").jwt)
    }

    async fn run_gate(auth_header: Option<&str>) -> Result<AuthUser, AppError> {
        let mut builder = Request::builder().uri("/api/expenses");
        if let Some(value) = auth_header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).expect("request").into_parts();
        AuthUser::from_request_parts(&mut parts, &keys()).await
    }

    #[test]
    fn bearer_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().expect("header"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, "bearer abc".parse().expect("header"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, "Basic dXNlcjpwdw==".parse().expect("header"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer ".parse().expect("header"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn valid_token_resolves_user() {
        let token = keys().issue(5).expect("sign");
        let user = run_gate(Some(&format!("Bearer {token}"))).await.expect("auth");
        assert_eq!(user, AuthUser(5));
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let err = run_gate(None).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Unauthenticated(AuthFailure::MissingToken)
        ));
    }

    #[tokio::test]
    async fn legacy_header_alone_is_not_accepted() {
        let token = keys().issue(5).expect("sign");
        let (mut parts, _) = Request::builder()
            .header("x-auth-token", token)
            .body(())
            .expect("request")
            .into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &keys())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Unauthenticated(AuthFailure::MissingToken)
        ));
    }

    #[tokio::test]
    async fn expired_and_forged_tokens_map_to_the_same_outcome() {
        let expired = keys()
            .issue_at(5, OffsetDateTime::now_utc() - Duration::days(30))
            .expect("sign");
        let forged = JwtKeys::from_config(&AppConfig::for_tests("someone-else").jwt)
            .issue(5)
            .expect("sign");

        let expired_err = run_gate(Some(&format!("Bearer {expired}"))).await.unwrap_err();
        let forged_err = run_gate(Some(&format!("Bearer {forged}"))).await.unwrap_err();

        assert!(matches!(
            expired_err,
            AppError::Unauthenticated(AuthFailure::InvalidToken(TokenError::Expired))
        ));
        assert!(matches!(
            forged_err,
            AppError::Unauthenticated(AuthFailure::InvalidToken(TokenError::InvalidSignature))
        ));
        assert_eq!(expired_err.status(), forged_err.status());
        assert_eq!(expired_err.public_message(), forged_err.public_message());
    }
}
