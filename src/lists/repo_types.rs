use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A named user list.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserList {
    pub id: Uuid,
    pub list_name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
