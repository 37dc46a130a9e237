use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            AuthResponse, ExternalSignupRequest, LoginRequest, PublicUser, SignupRequest,
            TokenResponse,
        },
        google::IdentityVerifier,
        jwt::TokenKeys,
        password::{hash_password, verify_password},
        repo::{StoreError, UserStore},
        repo_types::{NewUser, ProfileUpdate, User},
    },
    error::AuthError,
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims and drops empty strings.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Shared email/phone normalisation for signup and login.
fn contact(
    email: Option<String>,
    phone: Option<String>,
) -> Result<(Option<String>, Option<String>), AuthError> {
    let email = present(email).map(|e| e.to_lowercase());
    let phone = present(phone);
    if email.is_none() && phone.is_none() {
        return Err(AuthError::Validation(
            "either email or phone number is required".into(),
        ));
    }
    if let Some(e) = &email {
        if !is_valid_email(e) {
            return Err(AuthError::Validation("invalid email".into()));
        }
    }
    Ok((email, phone))
}

/// Orchestrates the signup and login flows. Every collaborator is injected.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    verifier: Arc<dyn IdentityVerifier>,
    tokens: TokenKeys,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.verifier.clone(), state.tokens.clone())
    }
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        verifier: Arc<dyn IdentityVerifier>,
        tokens: TokenKeys,
    ) -> Self {
        Self {
            store,
            verifier,
            tokens,
        }
    }

    fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        self.tokens.issue(user_id).map_err(|e| {
            error!(error = %e, %user_id, "jwt sign failed");
            AuthError::Internal(e.to_string())
        })
    }

    /// Create-only registration with a password.
    #[instrument(skip(self, req))]
    pub async fn signup(&self, req: SignupRequest) -> Result<AuthResponse, AuthError> {
        let (email, phone) = contact(req.email, req.phone_number)?;
        let name = present(req.name)
            .ok_or_else(|| AuthError::Validation("name is required".into()))?;
        let password = req
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AuthError::Validation("password is required".into()))?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        match self
            .store
            .find_by_email_or_phone(email.as_deref(), phone.as_deref())
            .await
        {
            Ok(existing) => {
                warn!(user_id = %existing.id, "signup for existing account");
                return Err(AuthError::Conflict(
                    "user already exists with this email or phone number".into(),
                ));
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let hash = hash_password(&password)?;
        let user = self
            .store
            .insert(NewUser::direct(email, phone, name, present(req.bio), hash))
            .await?;
        let token = self.issue(user.id)?;

        info!(user_id = %user.id, "user registered");
        Ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        })
    }

    /// Google signup-or-login. Repeat logins refresh the stored profile.
    #[instrument(skip(self, req))]
    pub async fn external_signup(
        &self,
        req: ExternalSignupRequest,
    ) -> Result<TokenResponse, AuthError> {
        let external_token = present(req.external_token)
            .ok_or_else(|| AuthError::Validation("external token is required".into()))?;

        let claims = self.verifier.exchange(&external_token).await.map_err(|e| {
            warn!(error = %e, "external token verification failed");
            AuthError::from(e)
        })?;

        let user = match self.store.find_by_external_id(&claims.external_id).await {
            Ok(existing) => {
                let update = ProfileUpdate {
                    name: claims.name,
                    email: claims.email,
                    profile_pic: claims.picture,
                };
                let user = self.store.update_profile(existing.id, update).await?;
                info!(user_id = %user.id, "external user profile refreshed");
                user
            }
            Err(StoreError::NotFound) => {
                let new_user = NewUser::external(
                    claims.external_id,
                    claims.email,
                    claims.name,
                    claims.picture,
                );
                let user = self.store.insert(new_user).await?;
                info!(user_id = %user.id, "external user registered");
                user
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.issue(user.id)?;
        Ok(TokenResponse { token })
    }

    /// Password login by email or phone. All credential failures look the same.
    #[instrument(skip(self, req))]
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AuthError> {
        let (email, phone) = contact(req.email, req.phone_number)?;
        let password = req
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AuthError::Validation("password is required".into()))?;

        let invalid = || AuthError::Authentication("invalid credentials".into());

        let user = match self
            .store
            .find_by_email_or_phone(email.as_deref(), phone.as_deref())
            .await
        {
            Ok(u) => u,
            Err(StoreError::NotFound) => {
                warn!("login for unknown account");
                return Err(invalid());
            }
            Err(e) => return Err(e.into()),
        };

        let Some(hash) = user.password_hash.as_deref() else {
            warn!(user_id = %user.id, "password login attempted on external account");
            return Err(invalid());
        };
        if !verify_password(&password, hash)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(invalid());
        }

        let token = self.issue(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        })
    }

    /// Resolves the user behind a verified token.
    pub async fn current_user(&self, user_id: Uuid) -> Result<PublicUser, AuthError> {
        let user: User = match self.store.find_by_id(user_id).await {
            Ok(u) => u,
            Err(StoreError::NotFound) => {
                return Err(AuthError::Authentication("user not found".into()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(PublicUser::from(&user))
    }
}
