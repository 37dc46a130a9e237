use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{config::JwtConfig, state::AppState};

/// Expired, tampered and malformed tokens are deliberately indistinguishable.
#[derive(Debug, thiserror::Error)]
#[error("invalid token")]
pub struct InvalidTokenError;

/// Server-side failure while minting a token.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("token expiry out of range")]
    ExpiryOutOfRange,
    #[error("jwt encode failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// HS256 signing and verification keys plus the token lifetime.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl From<&JwtConfig> for TokenKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self::new(&cfg.secret, Duration::days(cfg.ttl_days))
    }
}

impl TokenKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, SigningError> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<String, SigningError> {
        let exp = now
            .checked_add(self.ttl)
            .ok_or(SigningError::ExpiryOutOfRange)?;
        let claims = Claims {
            user_id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, InvalidTokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|_| InvalidTokenError)?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims.user_id)
    }
}
