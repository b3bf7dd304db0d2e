use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{error, warn};

use super::{
    jwt::{JwtKeys, TokenError},
    repo_types::User,
};
use crate::{error::ApiError, state::AppState};

/// The user behind a valid bearer token, resolved for the current request only.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                warn!("missing or malformed Authorization header");
                ApiError::Unauthorized("Invalid or missing token".into())
            })?;

        let keys = JwtKeys::from_ref(state);
        let user_id = keys.verify(token).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            match e {
                TokenError::Expired => ApiError::Unauthorized("Token expired".into()),
                TokenError::Invalid => ApiError::Unauthorized("Invalid token".into()),
            }
        })?;

        match state.users.find_by_id(user_id).await {
            Ok(Some(user)) => Ok(AuthUser(user)),
            Ok(None) => {
                warn!(%user_id, "token subject no longer exists");
                Err(ApiError::Unauthorized("Invalid token".into()))
            }
            Err(e) => {
                error!(error = ?e, %user_id, "user lookup failed");
                Err(ApiError::from(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::NewUser;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use time::{Duration, OffsetDateTime};
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn whoami(AuthUser(user): AuthUser) -> String {
        user.username
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .with_state(state)
    }

    async fn call(state: &AppState, header: Option<&str>) -> (StatusCode, String) {
        let mut req = Request::builder().uri("/whoami");
        if let Some(h) = header {
            req = req.header(AUTHORIZATION, h);
        }
        let res = app(state.clone())
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn seeded_user(state: &AppState) -> Uuid {
        let id = Uuid::new_v4();
        state
            .users
            .insert(&NewUser {
                id,
                username: "remy".into(),
                email: "remy@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .expect("insert");
        id
    }

    #[tokio::test]
    async fn valid_token_resolves_user() {
        let state = AppState::fake();
        let id = seeded_user(&state).await;
        let token = JwtKeys::from_ref(&state).issue(id).unwrap();
        let (status, body) = call(&state, Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "remy");
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_unauthorized() {
        let state = AppState::fake();
        let id = seeded_user(&state).await;
        let token = JwtKeys::from_ref(&state).issue(id).unwrap();

        for header in [
            None,
            Some("Bearer "),
            Some("Basic dXNlcjpwYXNz"),
            Some(token.as_str()),
        ] {
            let (status, body) = call(&state, header).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "header {header:?}");
            assert!(body.contains("Invalid or missing token"));
        }

        let (status, _) = call(&state, Some(&format!("bearer {token}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let state = AppState::fake();
        let id = seeded_user(&state).await;
        let token = JwtKeys::from_ref(&state)
            .issue_at(id, OffsetDateTime::now_utc() - Duration::days(8))
            .unwrap();
        let (status, body) = call(&state, Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Token expired"));
    }

    #[tokio::test]
    async fn token_for_unknown_user_looks_like_bad_token() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state).issue(Uuid::new_v4()).unwrap();
        let (status, body) = call(&state, Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Invalid token"));
    }
}
