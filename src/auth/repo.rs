use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

const USER_COLUMNS: &str = "id, first_name, last_name, gender, email, password_hash, image, \
     date_of_birth, academic_year, account_status, profile_completed, created_at, updated_at";

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with an already-hashed password.
    pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, gender, email, password_hash,
                               image, date_of_birth, academic_year)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.gender)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.image)
        .bind(new.date_of_birth)
        .bind(new.academic_year)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Role set for one user.
    pub async fn roles(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<String>> {
        let roles = sqlx::query_scalar::<_, String>(
            "SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role",
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(roles)
    }

    /// Which of the given addresses already belong to registered users.
    /// One batch query, regardless of input size.
    pub async fn existing_emails(db: &PgPool, emails: &[String]) -> anyhow::Result<Vec<String>> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }
        let found = sqlx::query_scalar::<_, String>(
            "SELECT email FROM users WHERE email = ANY($1)",
        )
        .bind(emails)
        .fetch_all(db)
        .await?;
        Ok(found)
    }
}

/// Put a token ID on the denylist until its natural expiry.
pub async fn revoke_token(db: &PgPool, jti: Uuid, expires_at: OffsetDateTime) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO revoked_tokens (jti, expires_at)
        VALUES ($1, $2)
        ON CONFLICT (jti) DO NOTHING
        "#,
    )
    .bind(jti)
    .bind(expires_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn is_token_revoked(db: &PgPool, jti: Uuid) -> anyhow::Result<bool> {
    let found = sqlx::query_scalar::<_, i32>("SELECT 1 FROM revoked_tokens WHERE jti = $1")
        .bind(jti)
        .fetch_optional(db)
        .await?;
    Ok(found.is_some())
}
