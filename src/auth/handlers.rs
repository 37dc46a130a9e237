use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            AuthResponse, ExternalSignupRequest, LoginRequest, PublicUser, SignupRequest,
            TokenResponse,
        },
        extractors::AuthUser,
        services::AuthService,
    },
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/external-signup", post(external_signup))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

#[instrument(skip(svc, payload))]
pub async fn signup(
    State(svc): State<AuthService>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let res = svc.signup(payload).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(svc, payload))]
pub async fn external_signup(
    State(svc): State<AuthService>,
    Json(payload): Json<ExternalSignupRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    Ok(Json(svc.external_signup(payload).await?))
}

#[instrument(skip(svc, payload))]
pub async fn login(
    State(svc): State<AuthService>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    Ok(Json(svc.login(payload).await?))
}

#[instrument(skip(svc))]
pub async fn get_me(
    State(svc): State<AuthService>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    Ok(Json(svc.current_user(user_id).await?))
}
