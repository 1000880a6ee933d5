use chrono::{
    DateTime,
    Utc,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    EntityName,
    UserEmail,
};
use crate::pagination::PageFilter;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, is_super, pending_confirm, pending_password, active, \
     created_at";

#[derive(Clone, Debug, serde::Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_super: bool,
    pub pending_confirm: bool,
    pub pending_password: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A validated user record ready to be persisted.
#[derive(Debug)]
pub struct NewUser {
    pub name: EntityName,
    pub email: UserEmail,
    pub password_hash: String,
    pub pending_confirm: bool,
}

/// The new state applied by an edit.
///
/// `password_hash` is `None` when the edit leaves the password untouched.
#[derive(Debug)]
pub struct UserChanges {
    pub name: EntityName,
    pub email: UserEmail,
    pub password_hash: Option<String>,
    pub is_super: bool,
    pub pending_confirm: bool,
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_all(pool: &PgPool, filter: &PageFilter) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users \
         WHERE ($1::text IS NULL OR name ILIKE $1) \
         ORDER BY created_at DESC, id \
         LIMIT $2 OFFSET $3",
        USER_COLUMNS
    ))
    .bind(filter.name_pattern())
    .bind(filter.limit())
    .bind(filter.offset())
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &PageFilter) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR name ILIKE $1)",
    )
    .bind(filter.name_pattern())
    .fetch_one(pool)
    .await
}

#[tracing::instrument(name = "inserting user record", skip(pool, new_user))]
pub async fn insert(pool: &PgPool, new_user: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (id, name, email, password_hash, pending_confirm, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(new_user.name.as_ref())
    .bind(new_user.email.as_ref())
    .bind(&new_user.password_hash)
    .bind(new_user.pending_confirm)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

#[tracing::instrument(name = "updating user record", skip(pool, changes))]
pub async fn update(pool: &PgPool, id: Uuid, changes: &UserChanges) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users \
         SET name = $2, \
             email = $3, \
             password_hash = COALESCE($4, password_hash), \
             is_super = $5, \
             pending_confirm = $6 \
         WHERE id = $1 \
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(id)
    .bind(changes.name.as_ref())
    .bind(changes.email.as_ref())
    .bind(changes.password_hash.as_deref())
    .bind(changes.is_super)
    .bind(changes.pending_confirm)
    .fetch_one(pool)
    .await
}

pub async fn set_active(pool: &PgPool, id: Uuid, active: bool) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET active = $2 WHERE id = $1 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(id)
    .bind(active)
    .fetch_one(pool)
    .await
}

/// Grants super authority; the grant stays pending until confirmed.
#[tracing::instrument(name = "promoting user record", skip(pool))]
pub async fn promote(pool: &PgPool, id: Uuid) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET is_super = TRUE, pending_confirm = TRUE WHERE id = $1 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_one(pool)
    .await
}

/// Replaces the password hash and clears the forced-reset flag.
pub async fn replace_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET password_hash = $2, pending_password = FALSE WHERE id = $1 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(id)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

#[tracing::instrument(name = "deleting user record", skip(pool))]
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
