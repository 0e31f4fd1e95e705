use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::UserSummary;
use crate::lists::repo_types::UserList;

impl UserList {
    pub async fn paginate(
        db: &PgPool,
        per_page: i64,
        page: i64,
    ) -> anyhow::Result<(Vec<UserList>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_lists")
            .fetch_one(db)
            .await?;

        let offset = (page - 1) * per_page;
        let lists = sqlx::query_as::<_, UserList>(
            r#"
            SELECT id, list_name, created_at, updated_at
            FROM user_lists
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(db)
        .await?;

        Ok((lists, total))
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<UserList>> {
        let list = sqlx::query_as::<_, UserList>(
            "SELECT id, list_name, created_at, updated_at FROM user_lists WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(list)
    }

    /// Whether a list name is in use, optionally ignoring one list (renames).
    pub async fn name_taken(
        db: &PgPool,
        name: &str,
        exclude: Option<Uuid>,
    ) -> anyhow::Result<bool> {
        let found = sqlx::query_scalar::<_, i32>(
            "SELECT 1 FROM user_lists WHERE list_name = $1 AND ($2::uuid IS NULL OR id <> $2)",
        )
        .bind(name)
        .bind(exclude)
        .fetch_optional(db)
        .await?;
        Ok(found.is_some())
    }

    pub async fn create(db: &PgPool, name: &str) -> anyhow::Result<UserList> {
        let list = sqlx::query_as::<_, UserList>(
            r#"
            INSERT INTO user_lists (list_name)
            VALUES ($1)
            RETURNING id, list_name, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(db)
        .await?;
        Ok(list)
    }

    pub async fn rename(db: &PgPool, id: Uuid, name: &str) -> anyhow::Result<UserList> {
        let list = sqlx::query_as::<_, UserList>(
            r#"
            UPDATE user_lists
            SET list_name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, list_name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_one(db)
        .await?;
        Ok(list)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM user_lists WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

pub async fn members(db: &PgPool, list_id: Uuid) -> anyhow::Result<Vec<UserSummary>> {
    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.id, u.first_name, u.last_name, u.email
        FROM users u
        JOIN user_list_members m ON m.user_id = u.id
        WHERE m.list_id = $1
        ORDER BY m.created_at ASC
        "#,
    )
    .bind(list_id)
    .fetch_all(db)
    .await?;
    Ok(users)
}

/// Users not yet on the list.
pub async fn available_users(db: &PgPool, list_id: Uuid) -> anyhow::Result<Vec<UserSummary>> {
    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.id, u.first_name, u.last_name, u.email
        FROM users u
        WHERE NOT EXISTS (
            SELECT 1 FROM user_list_members m
            WHERE m.list_id = $1 AND m.user_id = u.id
        )
        ORDER BY u.last_name, u.first_name
        "#,
    )
    .bind(list_id)
    .fetch_all(db)
    .await?;
    Ok(users)
}

/// Conditional insert; the composite primary key arbitrates concurrent adds.
/// Returns false when the membership already existed.
pub async fn add_member(db: &PgPool, list_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO user_list_members (list_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (list_id, user_id) DO NOTHING
        "#,
    )
    .bind(list_id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Returns false when there was no membership row to delete.
pub async fn remove_member(db: &PgPool, list_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "DELETE FROM user_list_members WHERE list_id = $1 AND user_id = $2",
    )
    .bind(list_id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() == 1)
}
