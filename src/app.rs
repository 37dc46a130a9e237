use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth;
use crate::config::AppConfig;
use crate::state::AppState;

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        google::{ExternalClaims, IdentityVerifier, VerificationError},
        jwt::TokenKeys,
        repo::memory::MemoryUserStore,
    };
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Accepts only the token "google-ok".
    struct OneAccount;

    #[async_trait]
    impl IdentityVerifier for OneAccount {
        async fn exchange(&self, token: &str) -> Result<ExternalClaims, VerificationError> {
            if token != "google-ok" {
                return Err(VerificationError::Status(401));
            }
            Ok(ExternalClaims {
                external_id: "g-42".into(),
                email: "g@x.com".into(),
                name: "Gee".into(),
                picture: None,
            })
        }
    }

    fn app() -> (Router, Arc<MemoryUserStore>, TokenKeys) {
        let (state, store) = AppState::fake(Arc::new(OneAccount));
        let keys = state.tokens.clone();
        (build_app(state), store, keys)
    }

    async fn post(app: &Router, uri: &str, body: Value) -> Response {
        app.clone()
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json_body(res: Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_static() {
        let (app, _, _) = app();
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await, json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn signup_then_repeat_conflicts() {
        let (app, store, keys) = app();
        let body = json!({ "email": "a@x.com", "name": "A", "password": "secret1" });

        let res = post(&app, "/auth/signup", body.clone()).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let json = json_body(res).await;
        let token = json["token"].as_str().unwrap();
        let stored = store.all();
        assert_eq!(keys.verify(token).unwrap(), stored[0].id);
        assert_eq!(json["user"]["email"], "a@x.com");
        assert!(json["user"].get("passwordHash").is_none());
        assert!(json["user"].get("password_hash").is_none());
        assert_ne!(stored[0].password_hash.as_deref(), Some("secret1"));

        let res = post(&app, "/auth/signup", body).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert!(json_body(res).await["error"].is_string());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn signup_validation_is_400() {
        let (app, _, _) = app();
        let res = post(&app, "/auth/signup", json!({ "name": "A", "password": "secret1" })).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn external_signup_status_codes() {
        let (app, store, keys) = app();

        let res = post(&app, "/auth/external-signup", json!({})).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = post(&app, "/auth/external-signup", json!({ "externalToken": "nope" })).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(res).await["error"], "invalid external token");

        let ok = json!({ "externalToken": "google-ok" });
        let res = post(&app, "/auth/external-signup", ok).await;
        assert_eq!(res.status(), StatusCode::OK);
        let json = json_body(res).await;
        assert!(json.get("user").is_none());
        let id = keys.verify(json["token"].as_str().unwrap()).unwrap();

        let legacy = json!({ "googleToken": "google-ok" });
        let res = post(&app, "/auth/external-signup", legacy).await;
        assert_eq!(res.status(), StatusCode::OK);
        let again = keys.verify(json_body(res).await["token"].as_str().unwrap()).unwrap();
        assert_eq!(id, again);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn login_and_me() {
        let (app, _, _) = app();
        post(
            &app,
            "/auth/signup",
            json!({ "phoneNumber": "+15550100", "name": "P", "password": "secret1" }),
        )
        .await;

        let bad = json!({ "phoneNumber": "+15550100", "password": "bad-pass" });
        let res = post(&app, "/auth/login", bad).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let good = json!({ "phoneNumber": "+15550100", "password": "secret1" });
        let res = post(&app, "/auth/login", good).await;
        assert_eq!(res.status(), StatusCode::OK);
        let token = json_body(res).await["token"].as_str().unwrap().to_string();

        let res = app
            .clone()
            .oneshot(
                Request::get("/auth/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["phoneNumber"], "+15550100");
    }

    #[tokio::test]
    async fn me_rejects_missing_or_bad_token() {
        let (app, _, _) = app();
        let res = app
            .clone()
            .oneshot(Request::get("/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .oneshot(
                Request::get("/auth/me")
                    .header(header::AUTHORIZATION, "Bearer a.b.c")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
