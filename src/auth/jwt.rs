use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState};

/// The only algorithm tokens are signed and accepted with.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
}

/// Signing and verification keys derived from the process-wide secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::new(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, user_id: Uuid, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + self.ttl;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding)?;
        debug!(user_id = %user_id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Any decode failure collapses to `Invalid`; expiry is checked against `now`
    /// only once the signature, algorithm and claims are known to be good.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::Invalid
        })?;

        if now.unix_timestamp() > data.claims.exp {
            debug!(user_id = %data.claims.sub, "jwt expired");
            return Err(TokenError::Expired);
        }
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str, issuer: &str, audience: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 60 * 24 * 7,
        }
    }

    fn make_keys() -> JwtKeys {
        JwtKeys::new(&config("dev-secret", "test-issuer", "test-aud"))
    }

    #[test]
    fn issued_token_verifies_to_same_user() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("issue");
        assert_eq!(keys.verify(&token), Ok(user_id));
    }

    #[test]
    fn token_is_valid_until_seven_days_have_passed() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let issued = OffsetDateTime::now_utc();
        let token = keys.issue_at(user_id, issued).expect("issue");

        let expiry = issued + Duration::days(7);
        assert_eq!(
            keys.verify_at(&token, expiry - Duration::seconds(1)),
            Ok(user_id)
        );
        assert_eq!(keys.verify_at(&token, expiry), Ok(user_id));
        assert_eq!(
            keys.verify_at(&token, expiry + Duration::seconds(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_issued_long_ago_is_expired_now() {
        let keys = make_keys();
        let token = keys
            .issue_at(Uuid::new_v4(), OffsetDateTime::now_utc() - Duration::days(8))
            .expect("issue");
        assert_eq!(keys.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let good = make_keys();
        let other = JwtKeys::new(&config("other-secret", "test-issuer", "test-aud"));
        let token = good.issue(Uuid::new_v4()).expect("issue");
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_with_bad_signature_is_invalid_not_expired() {
        let good = make_keys();
        let other = JwtKeys::new(&config("other-secret", "test-issuer", "test-aud"));
        let token = good
            .issue_at(Uuid::new_v4(), OffsetDateTime::now_utc() - Duration::days(30))
            .expect("issue");
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn other_algorithm_is_invalid_even_with_right_secret() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: now.unix_timestamp(),
            exp: (now + Duration::hours(1)).unix_timestamp(),
            iss: "test-issuer".into(),
            aud: "test-aud".into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .expect("encode");
        assert_eq!(keys.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn wrong_audience_or_garbage_is_invalid() {
        let keys = make_keys();
        let foreign = JwtKeys::new(&config("dev-secret", "test-issuer", "someone-else"));
        let token = foreign.issue(Uuid::new_v4()).expect("issue");
        assert_eq!(keys.verify(&token), Err(TokenError::Invalid));
        assert_eq!(keys.verify("not.a.jwt"), Err(TokenError::Invalid));
        assert_eq!(keys.verify(""), Err(TokenError::Invalid));
    }
}
