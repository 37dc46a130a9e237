use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,        // lower-cased, unique
    pub phone_number: Option<String>, // unique
    pub google_id: Option<String>,    // unique
    pub name: String,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // Argon2 PHC string, absent for Google accounts
    pub is_google: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A user about to be inserted. Built only through [`NewUser::direct`] or
/// [`NewUser::external`] so the credential invariants hold.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub(crate) email: Option<String>,
    pub(crate) phone_number: Option<String>,
    pub(crate) google_id: Option<String>,
    pub(crate) name: String,
    pub(crate) bio: Option<String>,
    pub(crate) profile_pic: Option<String>,
    pub(crate) password_hash: Option<String>,
    pub(crate) is_google: bool,
}

impl NewUser {
    pub fn direct(
        email: Option<String>,
        phone_number: Option<String>,
        name: String,
        bio: Option<String>,
        password_hash: String,
    ) -> Self {
        debug_assert!(email.is_some() || phone_number.is_some());
        Self {
            email,
            phone_number,
            google_id: None,
            name,
            bio,
            profile_pic: None,
            password_hash: Some(password_hash),
            is_google: false,
        }
    }

    pub fn external(
        google_id: String,
        email: String,
        name: String,
        profile_pic: Option<String>,
    ) -> Self {
        Self {
            email: Some(email),
            phone_number: None,
            google_id: Some(google_id),
            name,
            bio: None,
            profile_pic,
            password_hash: None,
            is_google: true,
        }
    }

    #[cfg(test)]
    pub(crate) fn into_user(self, id: Uuid, now: OffsetDateTime) -> User {
        User {
            id,
            email: self.email,
            phone_number: self.phone_number,
            google_id: self.google_id,
            name: self.name,
            bio: self.bio,
            profile_pic: self.profile_pic,
            password_hash: self.password_hash,
            is_google: self.is_google,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Profile fields refreshed on a repeat Google login.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub profile_pic: Option<String>,
}
