use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::auth::{
    password::{hash_password, verify_decoy, verify_password},
    repo::UserStore,
    repo_types::{NewUser, User},
};
use crate::error::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Username already exists")]
    DuplicateUsername,
    #[error("Email already exists")]
    DuplicateEmail,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("credential storage failed: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<CredentialError> for ApiError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::DuplicateUsername | CredentialError::DuplicateEmail => {
                ApiError::Conflict(e.to_string())
            }
            CredentialError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            CredentialError::Storage(inner) => ApiError::from(inner),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Register a user; `username` and `email` are expected to be normalized already.
pub async fn create_user(
    store: &dyn UserStore,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User, CredentialError> {
    if store.find_by_username(username).await?.is_some() {
        warn!(%username, "username already registered");
        return Err(CredentialError::DuplicateUsername);
    }
    if store.find_by_email(email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(CredentialError::DuplicateEmail);
    }

    let password_hash = hash_password(password)?;
    let user = store
        .insert(&NewUser {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await?;
    debug!(user_id = %user.id, "user created");
    Ok(user)
}

/// Unknown users and wrong passwords produce the same error.
pub async fn verify_credentials(
    store: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<User, CredentialError> {
    let Some(user) = store.find_by_username(username).await? else {
        verify_decoy(password);
        warn!(%username, "login unknown username");
        return Err(CredentialError::InvalidCredentials);
    };

    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(user),
        Ok(false) => {
            warn!(user_id = %user.id, "login invalid password");
            Err(CredentialError::InvalidCredentials)
        }
        Err(e) => {
            error!(error = %e, user_id = %user.id, "stored password hash unreadable");
            Err(CredentialError::InvalidCredentials)
        }
    }
}
