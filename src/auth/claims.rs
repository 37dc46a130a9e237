use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload. Field names match tokens already issued by earlier deployments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid, // subject
    pub iat: i64,      // issued at (unix timestamp)
    pub exp: i64,      // expires at (unix timestamp)
}
