use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GoogleConfig;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity provider rejected token with status {0}")]
    Status(u16),
    #[error("malformed userinfo payload: {0}")]
    Malformed(String),
    #[error("userinfo payload missing `{0}`")]
    MissingClaim(&'static str),
}

/// Verified profile of an external account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalClaims {
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

/// Raw userinfo response. v3 returns `sub`, v2 returns `id`.
#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(alias = "id")]
    sub: Option<String>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, VerificationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(VerificationError::MissingClaim(field))
}

impl TryFrom<UserInfo> for ExternalClaims {
    type Error = VerificationError;

    fn try_from(info: UserInfo) -> Result<Self, Self::Error> {
        Ok(Self {
            external_id: required(info.sub, "sub")?,
            email: required(info.email, "email")?.to_lowercase(),
            name: required(info.name, "name")?,
            picture: info.picture.filter(|p| !p.is_empty()),
        })
    }
}

/// Exchanges an opaque external bearer token for verified claims.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn exchange(&self, token: &str) -> Result<ExternalClaims, VerificationError>;
}

#[derive(Clone)]
pub struct GoogleVerifier {
    client: Client,
    userinfo_url: String,
}

impl GoogleVerifier {
    pub fn new(cfg: &GoogleConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            userinfo_url: cfg.userinfo_url.clone(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn exchange(&self, token: &str) -> Result<ExternalClaims, VerificationError> {
        let res = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(token)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            warn!(%status, "userinfo request rejected");
            return Err(VerificationError::Status(status.as_u16()));
        }

        let body = res.bytes().await?;
        let info: UserInfo = serde_json::from_slice(&body)
            .map_err(|e| VerificationError::Malformed(e.to_string()))?;
        let claims = ExternalClaims::try_from(info)?;
        debug!(external_id = %claims.external_id, "external token verified");
        Ok(claims)
    }
}
