use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for direct signup. Every field is optional at the JSON level
/// so missing values surface as validation errors rather than parse failures.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Option<String>,
    #[serde(alias = "phone_number", alias = "phone")]
    pub phone_number: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub bio: Option<String>,
}

/// Request body for Google signup/login.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExternalSignupRequest {
    #[serde(alias = "googleToken", alias = "external_token")]
    pub external_token: Option<String>,
}

/// Request body for password login.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    #[serde(alias = "phone_number", alias = "phone")]
    pub phone_number: Option<String>,
    pub password: Option<String>,
}

/// Response returned after signup or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Response returned by the Google flow.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub name: String,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub is_google: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            phone_number: u.phone_number.clone(),
            name: u.name.clone(),
            bio: u.bio.clone(),
            profile_pic: u.profile_pic.clone(),
            is_google: u.is_google,
            created_at: u.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signup_request_accepts_camel_case_and_missing_fields() {
        let req: SignupRequest =
            serde_json::from_value(json!({ "phoneNumber": "+15550100", "name": "A" })).unwrap();
        assert_eq!(req.phone_number.as_deref(), Some("+15550100"));
        assert!(req.email.is_none());
        assert!(req.password.is_none());
    }

    #[test]
    fn external_request_accepts_legacy_field_name() {
        let req: ExternalSignupRequest =
            serde_json::from_value(json!({ "googleToken": "ya29.abc" })).unwrap();
        assert_eq!(req.external_token.as_deref(), Some("ya29.abc"));
    }

    #[test]
    fn public_user_never_contains_password_hash() {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: Some("test@example.com".into()),
            phone_number: None,
            google_id: None,
            name: "Test".into(),
            bio: None,
            profile_pic: None,
            password_hash: Some("$argon2id$v=19$secret".into()),
            is_google: false,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"isGoogle\":false"));
        assert!(!json.contains("argon2"));

        let raw = serde_json::to_string(&user).unwrap();
        assert!(!raw.contains("argon2"));
    }
}
