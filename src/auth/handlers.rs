use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MeResponse, PublicUser, SignupRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        repo_types::User,
        services::{create_user, is_valid_email, verify_credentials},
    },
    error::{ApiError, ApiJson, ApiResponse, ApiResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn token_issue_failed(e: anyhow::Error) -> ApiError {
    error!(error = ?e, "jwt signing failed");
    ApiError::Internal("Could not issue token".into())
}

fn auth_response(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let token = JwtKeys::from_ref(state)
        .issue(user.id)
        .map_err(token_issue_failed)?;
    Ok(AuthResponse {
        token,
        user: PublicUser {
            id: user.id,
            username: user.username,
        },
    })
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let username = present(payload.username);
    let email = present(payload.email).map(|e| e.to_lowercase());
    // Passwords are taken verbatim; only emptiness is checked.
    let password = payload.password.filter(|p| !p.is_empty());

    let (username, email, password) = match (username, email, password) {
        (Some(u), Some(e), Some(p)) => (u, e, p),
        (u, e, p) => {
            let missing = [
                ("username", u.is_none()),
                ("email", e.is_none()),
                ("password", p.is_none()),
            ]
            .into_iter()
            .filter_map(|(field, absent)| absent.then_some(field))
            .collect();
            warn!("signup with missing fields");
            return Err(ApiError::missing_fields(missing));
        }
    };

    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }

    let user = create_user(state.users.as_ref(), &username, &email, &password).await?;
    info!(user_id = %user.id, %username, "user registered");

    let body = auth_response(&state, user)?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(body, "User created successfully"),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let (Some(username), Some(password)) = (
        present(payload.username),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::Unauthorized("Invalid username or password".into()));
    };

    let user = verify_credentials(state.users.as_ref(), &username, &password).await?;
    info!(user_id = %user.id, "user logged in");

    let body = auth_response(&state, user)?;
    Ok(ApiResponse::with_message(body, "Login successful"))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> ApiResult<MeResponse> {
    Ok(ApiResponse::ok(MeResponse {
        id: user.id,
        username: user.username,
        email: user.email,
    }))
}
